use log::{debug, warn};
use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    Response, Url,
};
use typed_builder::TypedBuilder;

use crate::config::StationConfig;

/// Pages of a playlist archive.
///
/// `Ok(None)` means the server answered with a non-success status;
/// transport errors are returned as `Err`.
#[allow(async_fn_in_trait)]
pub trait PlaylistSource {
    /// The page holding the day and hour selection lists.
    async fn fetch_selection_page(&mut self) -> anyhow::Result<Option<String>>;
    /// The playlist of a single hour.
    async fn fetch_hour_page(&mut self, day: &str, hour: &str) -> anyhow::Result<Option<String>>;
}

/// The form submitted to ask for the playlist of an hour.
#[derive(Debug, TypedBuilder)]
pub struct HourRequest<'a> {
    day_field: &'a str,
    day: &'a str,
    hour_field: &'a str,
    hour: &'a str,
}
impl HourRequest<'_> {
    pub fn query_string(&self) -> anyhow::Result<String> {
        let pairs: &[(&str, &str)] = &[(self.day_field, self.day), (self.hour_field, self.hour)];
        Ok(serde_html_form::to_string(pairs)?)
    }
}

pub struct PlaylistClient {
    client: reqwest::Client,
    url: Url,
    day_field: String,
    hour_field: String,
}

impl PlaylistClient {
    pub fn new(config: &StationConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self {
            client,
            url: config.playlist_url.clone(),
            day_field: config.day_field.clone(),
            hour_field: config.hour_field.clone(),
        })
    }
}

impl PlaylistSource for PlaylistClient {
    async fn fetch_selection_page(&mut self) -> anyhow::Result<Option<String>> {
        debug!("GET {}", self.url);
        let response = self.client.get(self.url.clone()).send().await?;
        text_if_success(response).await
    }

    async fn fetch_hour_page(&mut self, day: &str, hour: &str) -> anyhow::Result<Option<String>> {
        let body = HourRequest::builder()
            .day_field(&self.day_field)
            .day(day)
            .hour_field(&self.hour_field)
            .hour(hour)
            .build()
            .query_string()?;
        debug!("POST {} with {body}", self.url);
        let response = self
            .client
            .post(self.url.clone())
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body)
            .send()
            .await?;
        text_if_success(response).await
    }
}

async fn text_if_success(response: Response) -> anyhow::Result<Option<String>> {
    let status = response.status();
    if !status.is_success() {
        warn!("{} responded with {status}", response.url());
        return Ok(None);
    }
    Ok(Some(response.text().await?))
}
