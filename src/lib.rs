pub mod api;
pub mod chart;
pub mod config;
pub mod data_collector;
pub mod flatten;
pub mod markup;
pub mod occurrence;
pub mod parser;
pub mod schema;
pub mod store;
pub mod time_of_day;
