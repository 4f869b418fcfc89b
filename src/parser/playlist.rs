use std::borrow::Cow;

use itertools::Itertools;
use log::debug;
use playlist_scraping_utils::regex;
use regex::Captures;
use thiserror::Error;

use crate::{
    markup::{events, MarkupEvent},
    schema::RawRow,
    time_of_day::{TimeOfDay, TimeOfDayParseError},
};

/// Stands in for `&` while the page goes through the HTML parser.
pub const AMPERSAND_PLACEHOLDER: &str = "##amp;##";

/// Row classes of the playlist table, alternating between lines.
pub const DEFAULT_ROW_CLASSES: [&str; 2] = ["bg1", "bg2"];

#[derive(Debug, Error)]
pub enum PlaylistParseError {
    #[error("Failed to convert {:?} to time data; the cells {row:?} are out of step with the table columns", .row[0])]
    Desync {
        row: [String; 3],
        #[source]
        source: TimeOfDayParseError,
    },
}

/// Replaces `&amp;` and bare `&` by [`AMPERSAND_PLACEHOLDER`].
/// Other character references are left for the HTML parser.
pub fn escape_ampersands(markup: &str) -> Cow<str> {
    regex!(r"&(amp;|[A-Za-z][A-Za-z0-9]*;|#[0-9]+;|#[xX][0-9A-Fa-f]+;)?").replace_all(
        markup,
        |captures: &Captures| match captures.get(1) {
            Some(reference) if reference.as_str() != "amp;" => captures[0].to_owned(),
            _ => AMPERSAND_PLACEHOLDER.to_owned(),
        },
    )
}

fn unescape_ampersands(text: &str) -> String {
    text.replace(AMPERSAND_PLACEHOLDER, "&")
}

/// Extracts the playlist of an hour page whose `&`s were replaced by [`escape_ampersands`].
pub fn extract_playlist_rows(markup: &str) -> Result<Vec<RawRow>, PlaylistParseError> {
    parse(markup, &DEFAULT_ROW_CLASSES)
}

pub fn parse<S: AsRef<str>>(
    markup: &str,
    row_classes: &[S],
) -> Result<Vec<RawRow>, PlaylistParseError> {
    let mut table = TableState::default();
    for event in &events(markup) {
        table.feed(event, row_classes)?;
    }
    table.close_cell()?;
    Ok(table.rows)
}

/// Elements that start a new line of text when they appear inside a cell.
const LINE_BREAKING: [&str; 16] = [
    "br", "p", "div", "li", "ul", "ol", "dl", "dt", "dd", "hr", "h1", "h2", "h3", "h4", "h5",
    "h6",
];

#[derive(Default)]
struct TableState {
    in_marked_row: bool,
    /// Lines of the open cell of a marked row.
    cell_lines: Option<Vec<String>>,
    accumulator: RowAccumulator,
    rows: Vec<RawRow>,
}

impl TableState {
    fn feed<S: AsRef<str>>(
        &mut self,
        event: &MarkupEvent,
        row_classes: &[S],
    ) -> Result<(), PlaylistParseError> {
        match event {
            MarkupEvent::Open(tag) if tag.name() == "tr" => {
                self.close_cell()?;
                self.in_marked_row = tag
                    .attr("class")
                    .is_some_and(|class| row_classes.iter().any(|x| x.as_ref() == class));
            }
            MarkupEvent::Open(tag) if tag.name() == "td" || tag.name() == "th" => {
                // `</td>` is optional.
                self.close_cell()?;
                if tag.name() == "td" && self.in_marked_row {
                    self.cell_lines = Some(vec![String::new()]);
                }
            }
            MarkupEvent::Open(tag) if LINE_BREAKING.contains(&tag.name()) => self.break_line(),
            MarkupEvent::Text(text) => {
                if let Some(last) = self.cell_lines.as_mut().and_then(|lines| lines.last_mut()) {
                    last.push_str(text);
                }
            }
            MarkupEvent::Close(name) if matches!(&**name, "td" | "th" | "tr" | "table") => {
                self.close_cell()?;
            }
            MarkupEvent::Close(name) if LINE_BREAKING.contains(&&**name) => self.break_line(),
            _ => {}
        }
        Ok(())
    }

    fn break_line(&mut self) {
        if let Some(lines) = &mut self.cell_lines {
            lines.push(String::new());
        }
    }

    /// Turns the open cell, if any, into a fragment: its lines trimmed and joined by a space.
    fn close_cell(&mut self) -> Result<(), PlaylistParseError> {
        let Some(lines) = self.cell_lines.take() else {
            return Ok(());
        };
        let fragment = lines
            .iter()
            .map(|line| unescape_ampersands(line.trim()))
            .filter(|line| !line.is_empty())
            .join(" ");
        if !fragment.is_empty() {
            if let Some(row) = self.accumulator.push(fragment)? {
                self.rows.push(row);
            }
        }
        Ok(())
    }
}

/// Groups cell texts into rows of (time, title, artist).
///
/// A broken line of the table may leave a lone time cell behind, e.g. `00:00:00` followed by
/// empty cells.  Whenever the second buffered fragment is a time itself, the first one is
/// dropped, as many times as needed.
#[derive(Default, Debug)]
pub struct RowAccumulator {
    fragments: Vec<String>,
}

impl RowAccumulator {
    pub fn push(&mut self, fragment: String) -> Result<Option<RawRow>, PlaylistParseError> {
        self.fragments.push(fragment);
        while self.fragments.len() > 1 && TimeOfDay::parse_hms(&self.fragments[1]).is_ok() {
            let dropped = self.fragments.remove(0);
            debug!("Dropped {dropped:?} followed by another time cell");
        }
        match <[String; 3]>::try_from(std::mem::take(&mut self.fragments)) {
            Ok(row) => match TimeOfDay::parse_hms(&row[0]) {
                Ok(time) => {
                    let [_, title, artist] = row;
                    Ok(Some(
                        RawRow::builder()
                            .time(time)
                            .title(title)
                            .artist(artist)
                            .build(),
                    ))
                }
                Err(source) => Err(PlaylistParseError::Desync { row, source }),
            },
            Err(fragments) => {
                self.fragments = fragments;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::{
        escape_ampersands, extract_playlist_rows, parse, PlaylistParseError, RowAccumulator,
    };
    use crate::{
        schema::{HourKey, HourlyRecord},
        time_of_day::TimeOfDay,
    };

    fn page(rows: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html><head><title>Playlist</title></head><body>
<table class="playlist">
  <tr><th>Zeit</th><th>Titel</th><th>Interpret</th></tr>
  {rows}
</table>
</body></html>"#
        )
    }

    fn triples(rows: &[crate::schema::RawRow]) -> Vec<(u32, &str, &str)> {
        rows.iter()
            .map(|row| (row.time().get(), row.title().as_str(), row.artist().as_str()))
            .collect_vec()
    }

    #[test]
    fn single_row_to_hourly_record() {
        let markup =
            page(r#"<tr class="bg1"><td>14:05:00</td><td>Imagine</td><td>John Lennon</td></tr>"#);
        let rows = extract_playlist_rows(&escape_ampersands(&markup)).unwrap();
        let record = HourlyRecord::new(HourKey::new("2023-05-01", "14"), rows);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"2023-05-01-14":[[50700,"Imagine","John Lennon"]]}"#
        );
    }

    #[test]
    fn bare_row_to_hourly_record() {
        let markup = r#"<tr class="bg1"><td>14:05:00</td><td>Imagine</td><td>John Lennon</td></tr>"#;
        let rows = extract_playlist_rows(&escape_ampersands(markup)).unwrap();
        let record = HourlyRecord::new(HourKey::new("2023-05-01", "14"), rows);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"2023-05-01-14":[[50700,"Imagine","John Lennon"]]}"#
        );
    }

    #[test]
    fn bare_row_with_ampersand() {
        let markup =
            r#"<tr class="bg2"><td>10:00:00</td><td>Rock &amp; Roll</td><td>Led Zeppelin</td></tr>"#;
        let rows = extract_playlist_rows(&escape_ampersands(markup)).unwrap();
        assert_eq!(triples(&rows), [(36000, "Rock & Roll", "Led Zeppelin")]);
    }

    #[test]
    fn line_breaks_inside_a_cell_become_spaces() {
        let markup = page(
            r#"<tr class="bg1"><td>08:00:00</td><td>The Sound<br>of Silence</td><td>Simon<br>Garfunkel</td></tr>
               <tr class="bg2"><td>08:04:00</td><td><p>Mrs.</p><p>Robinson</p></td><td>Simon<br/>
                 &amp;<br>  Garfunkel</td></tr>
               <tr class="bg1"><td>08:08:00</td><td>A<b>B</b>  C</td><td><br>X<br><br></td></tr>"#,
        );
        let rows = extract_playlist_rows(&escape_ampersands(&markup)).unwrap();
        assert_eq!(
            triples(&rows),
            [
                (28800, "The Sound of Silence", "Simon Garfunkel"),
                (29040, "Mrs. Robinson", "Simon & Garfunkel"),
                (29280, "AB  C", "X"),
            ]
        );
    }

    #[test]
    fn unclosed_cells() {
        let markup = r#"<tr class="bg1"><td>09:00:00<td>Title<td>Artist<tr class="bg2"><td>09:03:00<td>T<td>A"#;
        let rows = extract_playlist_rows(markup).unwrap();
        assert_eq!(
            triples(&rows),
            [(32400, "Title", "Artist"), (32580, "T", "A")]
        );
    }

    #[test]
    fn ampersand_survives() {
        let markup = page(
            r#"<tr class="bg2"><td>10:00:00</td><td>Rock &amp; Roll</td><td>Led Zeppelin</td></tr>
               <tr class="bg1"><td>10:04:00</td><td>Best of R&B</td><td>Simon & Garfunkel</td></tr>"#,
        );
        let rows = extract_playlist_rows(&escape_ampersands(&markup)).unwrap();
        assert_eq!(
            triples(&rows),
            [
                (36000, "Rock & Roll", "Led Zeppelin"),
                (36240, "Best of R&B", "Simon & Garfunkel"),
            ]
        );
    }

    #[test]
    fn escape_keeps_other_references() {
        assert_eq!(
            escape_ampersands("Rock &amp; Roll & R&B &quot;x&quot; &#39; &#x27;"),
            "Rock ##amp;## Roll ##amp;## R##amp;##B &quot;x&quot; &#39; &#x27;"
        );
        assert_eq!(escape_ampersands("nothing to do"), "nothing to do");
    }

    #[test]
    fn accumulator_drops_leading_fragments() {
        let mut accumulator = RowAccumulator::default();
        assert!(accumulator.push("".to_owned()).unwrap().is_none());
        assert!(accumulator.push("00:00:00".to_owned()).unwrap().is_none());
        assert!(accumulator.push("A".to_owned()).unwrap().is_none());
        let row = accumulator.push("B".to_owned()).unwrap().unwrap();
        assert_eq!(row.time(), TimeOfDay::try_from(0).unwrap());
        assert_eq!(row.title(), "A");
        assert_eq!(row.artist(), "B");
    }

    #[test]
    fn accumulator_drops_several_leading_times() {
        let mut accumulator = RowAccumulator::default();
        for fragment in ["00:00:00", "01:00:00", "02:00:00", "Title"] {
            assert!(accumulator.push(fragment.to_owned()).unwrap().is_none());
        }
        let row = accumulator.push("Artist".to_owned()).unwrap().unwrap();
        assert_eq!(row.time().get(), 7200);
        assert_eq!(row.title(), "Title");
        assert_eq!(row.artist(), "Artist");
        // The buffer starts over after a row.
        assert!(accumulator.push("03:00:00".to_owned()).unwrap().is_none());
    }

    #[test]
    fn broken_line_is_skipped() {
        let markup = page(
            r#"<tr class="bg1"><td>00:00:00</td><td></td><td>  </td></tr>
               <tr class="bg2"><td>14:05:00</td><td>Imagine</td><td>John Lennon</td></tr>
               <tr class="bg1"><td>14:09:00</td><td>Help!</td><td>The Beatles</td></tr>"#,
        );
        let rows = extract_playlist_rows(&markup).unwrap();
        assert_eq!(
            triples(&rows),
            [
                (50700, "Imagine", "John Lennon"),
                (50940, "Help!", "The Beatles"),
            ]
        );
    }

    #[test]
    fn unmarked_rows_are_ignored() {
        let markup = page(
            r#"<tr class="head"><td>Zeit</td><td>Titel</td><td>Interpret</td></tr>
               <tr class="bg1 active"><td>13:00:00</td><td>X</td><td>Y</td></tr>
               <tr><td>13:01:00</td><td>X</td><td>Y</td></tr>
               <tr class="bg2"><td>13:02:00</td><td>
                 <a href="/artist/1">Title</a>
               </td><td><b>Art</b>ist</td></tr>"#,
        );
        let rows = extract_playlist_rows(&markup).unwrap();
        assert_eq!(triples(&rows), [(46920, "Title", "Artist")]);
    }

    #[test]
    fn custom_row_classes() {
        let markup = page(
            r#"<tr class="odd"><td>01:00:00</td><td>A</td><td>a</td></tr>
               <tr class="bg1"><td>01:01:00</td><td>B</td><td>b</td></tr>
               <tr class="even"><td>01:02:00</td><td>C</td><td>c</td></tr>"#,
        );
        let rows = parse(&markup, &["odd", "even"]).unwrap();
        assert_eq!(triples(&rows), [(3600, "A", "a"), (3720, "C", "c")]);
    }

    #[test]
    fn out_of_step_cells_are_fatal() {
        let markup = page(
            r#"<tr class="bg1"><td>Imagine</td><td>John Lennon</td><td>1971</td></tr>"#,
        );
        match extract_playlist_rows(&markup) {
            Err(PlaylistParseError::Desync { row, .. }) => {
                assert_eq!(row, ["Imagine", "John Lennon", "1971"]);
            }
            res => panic!("Unexpected result: {res:?}"),
        }
    }

    #[test]
    fn empty_page() {
        assert!(extract_playlist_rows(&page("")).unwrap().is_empty());
        assert!(extract_playlist_rows("").unwrap().is_empty());
    }
}
