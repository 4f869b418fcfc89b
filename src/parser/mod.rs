pub mod playlist;
pub mod selection;
