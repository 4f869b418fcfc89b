use anyhow::Context;
use log::{debug, info, warn};
use tokio::time::sleep;

use crate::{
    api::PlaylistSource,
    config::StationConfig,
    parser::{
        playlist::{self, escape_ampersands},
        selection,
    },
    schema::{HourKey, HourlyRecord, Snapshot},
};

/// Downloads the playlist of every hour offered by the selection page.
///
/// Days are requested from the last listed one to the first, hours in the listed order.
/// An hour whose page could not be retrieved is recorded with no rows.
pub async fn fetch_all<S: PlaylistSource>(
    source: &mut S,
    config: &StationConfig,
) -> anyhow::Result<Snapshot> {
    let Some(page) = source.fetch_selection_page().await? else {
        warn!("The selection page could not be retrieved.  Nothing to do.");
        return Ok(vec![]);
    };
    let selection::Selection { days, hours } =
        selection::parse(&page, &config.day_field, &config.hour_field);
    info!("Found {} days and {} hours.", days.len(), hours.len());

    let interval = config.request_interval();
    let mut records = Vec::with_capacity(days.len() * hours.len());
    for day in days.iter().rev() {
        for hour in &hours {
            info!("Getting for {day} - {hour}...");
            let rows = match source.fetch_hour_page(day, hour).await? {
                Some(body) => playlist::parse(
                    &escape_ampersands(&body),
                    config.row_classes.as_slice(),
                )
                .with_context(|| format!("While reading the playlist of {day} - {hour}"))?,
                None => {
                    warn!("  Could not retrieve {day} - {hour}; recording it as empty.");
                    vec![]
                }
            };
            debug!("  {} songs", rows.len());
            records.push(HourlyRecord::new(HourKey::new(day, hour), rows));
            if !interval.is_zero() {
                sleep(interval).await;
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::bail;
    use itertools::Itertools;

    use super::fetch_all;
    use crate::{api::PlaylistSource, config::StationConfig, parser::playlist::PlaylistParseError};

    #[derive(Default)]
    struct ScriptedSource {
        selection: Option<String>,
        hours: HashMap<(String, String), Option<String>>,
        requests: Vec<String>,
    }

    impl ScriptedSource {
        fn with_selection(days: &[&str], hours: &[&str]) -> Self {
            let options = |name: &str, values: &[&str]| {
                let options = values
                    .iter()
                    .map(|v| format!(r#"<option value="{v}">{v}</option>"#))
                    .join("");
                format!(r#"<select name="{name}">{options}</select>"#)
            };
            Self {
                selection: Some(format!(
                    "<html><body><form>{}{}</form></body></html>",
                    options("pl_day", days),
                    options("pl_hour", hours)
                )),
                ..Default::default()
            }
        }

        fn page(mut self, day: &str, hour: &str, rows: &str) -> Self {
            let body = format!("<html><body><table>{rows}</table></body></html>");
            self.hours
                .insert((day.to_owned(), hour.to_owned()), Some(body));
            self
        }

        fn failing(mut self, day: &str, hour: &str) -> Self {
            self.hours.insert((day.to_owned(), hour.to_owned()), None);
            self
        }
    }

    impl PlaylistSource for ScriptedSource {
        async fn fetch_selection_page(&mut self) -> anyhow::Result<Option<String>> {
            self.requests.push("selection".to_owned());
            Ok(self.selection.clone())
        }

        async fn fetch_hour_page(
            &mut self,
            day: &str,
            hour: &str,
        ) -> anyhow::Result<Option<String>> {
            self.requests.push(format!("{day}-{hour}"));
            match self.hours.get(&(day.to_owned(), hour.to_owned())) {
                Some(page) => Ok(page.clone()),
                None => Ok(Some("<html><body></body></html>".to_owned())),
            }
        }
    }

    struct Unreachable;
    impl PlaylistSource for Unreachable {
        async fn fetch_selection_page(&mut self) -> anyhow::Result<Option<String>> {
            bail!("connection refused")
        }
        async fn fetch_hour_page(&mut self, _: &str, _: &str) -> anyhow::Result<Option<String>> {
            bail!("connection refused")
        }
    }

    fn keys(records: &[crate::schema::HourlyRecord]) -> Vec<String> {
        records.iter().map(|r| r.key().to_string()).collect()
    }

    #[tokio::test]
    async fn days_in_reverse_hours_in_order() {
        let mut source =
            ScriptedSource::with_selection(&["2023-05-01", "2023-05-02", "2023-05-03"], &["0", "1"]);
        let records = fetch_all(&mut source, &StationConfig::default())
            .await
            .unwrap();
        assert_eq!(
            keys(&records),
            [
                "2023-05-03-0",
                "2023-05-03-1",
                "2023-05-02-0",
                "2023-05-02-1",
                "2023-05-01-0",
                "2023-05-01-1"
            ]
        );
        assert_eq!(source.requests.len(), 3 * 2 + 1);
        assert_eq!(source.requests[0], "selection");
        assert_eq!(source.requests[1], "2023-05-03-0");
    }

    #[tokio::test]
    async fn rows_are_parsed_with_ampersands() {
        let mut source = ScriptedSource::with_selection(&["2023-05-01"], &["14"]).page(
            "2023-05-01",
            "14",
            r#"<tr class="bg1"><td>14:05:00</td><td>Rock &amp; Roll</td><td>Simon & Garfunkel</td></tr>"#,
        );
        let records = fetch_all(&mut source, &StationConfig::default())
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_string(&records).unwrap(),
            r#"[{"2023-05-01-14":[[50700,"Rock & Roll","Simon & Garfunkel"]]}]"#
        );
    }

    #[tokio::test]
    async fn failed_hour_is_recorded_empty() {
        let mut source = ScriptedSource::with_selection(&["2023-05-01"], &["0", "1", "2"])
            .failing("2023-05-01", "1")
            .page(
                "2023-05-01",
                "2",
                r#"<tr class="bg2"><td>02:00:00</td><td>A</td><td>a</td></tr>"#,
            );
        let records = fetch_all(&mut source, &StationConfig::default())
            .await
            .unwrap();
        assert_eq!(keys(&records), ["2023-05-01-0", "2023-05-01-1", "2023-05-01-2"]);
        assert!(records[1].rows().is_empty());
        assert_eq!(records[2].rows().len(), 1);
        assert_eq!(source.requests.len(), 4);
    }

    #[tokio::test]
    async fn missing_selection_page() {
        let mut source = ScriptedSource::default();
        let records = fetch_all(&mut source, &StationConfig::default())
            .await
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(source.requests, ["selection"]);
    }

    #[tokio::test]
    async fn no_options_means_no_requests() {
        let mut source = ScriptedSource::with_selection(&[], &["0", "1"]);
        let records = fetch_all(&mut source, &StationConfig::default())
            .await
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(source.requests.len(), 1);
    }

    #[tokio::test]
    async fn desync_aborts_the_run() {
        let mut source = ScriptedSource::with_selection(&["2023-05-01"], &["0", "1"]).page(
            "2023-05-01",
            "0",
            r#"<tr class="bg1"><td>Title</td><td>Artist</td><td>Extra</td></tr>"#,
        );
        let err = fetch_all(&mut source, &StationConfig::default())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<PlaylistParseError>().is_some());
        assert_eq!(source.requests.len(), 2);
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        assert!(fetch_all(&mut Unreachable, &StationConfig::default())
            .await
            .is_err());
    }
}
