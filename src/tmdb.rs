use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::MediaError;
use crate::filters::{compose_discover_params, FilterSet};
use crate::models::{
    ContentItem, Genre, MediaType, MovieItem, SeriesItem, TimeWindow, TrendingScope,
};

const DETAIL_APPENDS: &str = "credits,videos";

/// Metadata service operations. List calls never fail: upstream problems are
/// logged and come back as an empty list. Only `details` reports errors.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn trending(&self, scope: TrendingScope, window: TimeWindow) -> Vec<ContentItem>;
    async fn popular(&self, media_type: MediaType) -> Vec<ContentItem>;
    async fn top_rated(&self, media_type: MediaType) -> Vec<ContentItem>;
    async fn search_multi(&self, query: &str) -> Vec<ContentItem>;
    async fn genres(&self, media_type: MediaType) -> Vec<Genre>;
    async fn details(&self, id: u64, media_type: MediaType) -> Result<ContentItem, MediaError>;
    async fn discover(&self, media_type: MediaType, filters: &FilterSet) -> Vec<ContentItem>;
    async fn similar(&self, id: u64, media_type: MediaType) -> Vec<ContentItem>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    language: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(
        api_key: impl Into<String>,
        language: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let user_agent = format!("cinemax/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        let base_url: String = base_url.into();
        Ok(Self {
            client,
            api_key: api_key.into(),
            language: language.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.tmdb_api_key.clone(),
            settings.language.clone(),
            settings.tmdb_base_url.clone(),
            settings.http_timeout,
        )
    }

    fn endpoint_url(&self, path: &str, params: &[(String, String)]) -> String {
        let mut url = format!(
            "{}{}?api_key={}&language={}",
            self.base_url,
            path,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.language)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn send(&self, url: &str, path: &str) -> Result<reqwest::Response, MediaError> {
        match self.client.get(url).send().await {
            Ok(res) => Ok(res),
            Err(e) => {
                let first = MediaError::from(e.without_url());
                if !first.is_transport() {
                    return Err(first);
                }
                let delay = retry_delay();
                warn!(
                    "Transport failure on {} ({}), retrying once in {:?}",
                    path, first, delay
                );
                tokio::time::sleep(delay).await;
                self.client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| MediaError::from(e.without_url()))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, MediaError> {
        let url = self.endpoint_url(path, params);
        debug!("GET {}", path);
        let res = self.send(&url, path).await?;
        let status = res.status();
        let text = res.text().await.map_err(|e| MediaError::from(e.without_url()))?;
        if !status.is_success() {
            return Err(MediaError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }
        serde_json::from_str(&text)
            .map_err(|e| MediaError::UpstreamEmpty(format!("{}: {}", path, e)))
    }

    async fn fetch_list(
        &self,
        path: &str,
        params: &[(String, String)],
        context: Option<MediaType>,
    ) -> Vec<ContentItem> {
        match self.get_json::<ResultsPage>(path, params).await {
            Ok(page) => match page.results {
                Some(results) => parse_results(results, context),
                None => {
                    warn!("{}", MediaError::UpstreamEmpty(format!("{} has no results field", path)));
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Treating {} as empty: {}", path, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn trending(&self, scope: TrendingScope, window: TimeWindow) -> Vec<ContentItem> {
        let path = format!("/trending/{}/{}", scope.as_path(), window.as_path());
        self.fetch_list(&path, &[], scope.media_type()).await
    }

    async fn popular(&self, media_type: MediaType) -> Vec<ContentItem> {
        let path = format!("/{}/popular", media_type.as_path());
        self.fetch_list(&path, &first_page(), Some(media_type)).await
    }

    async fn top_rated(&self, media_type: MediaType) -> Vec<ContentItem> {
        let path = format!("/{}/top_rated", media_type.as_path());
        self.fetch_list(&path, &first_page(), Some(media_type)).await
    }

    async fn search_multi(&self, query: &str) -> Vec<ContentItem> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let mut params = vec![("query".to_string(), query.to_string())];
        params.extend(first_page());
        self.fetch_list("/search/multi", &params, None).await
    }

    async fn genres(&self, media_type: MediaType) -> Vec<Genre> {
        let path = format!("/genre/{}/list", media_type.as_path());
        match self.get_json::<GenreList>(&path, &[]).await {
            Ok(list) => list.genres.unwrap_or_default(),
            Err(e) => {
                warn!("Treating {} as empty: {}", path, e);
                Vec::new()
            }
        }
    }

    async fn details(&self, id: u64, media_type: MediaType) -> Result<ContentItem, MediaError> {
        let path = format!("/{}/{}", media_type.as_path(), id);
        let params = vec![(
            "append_to_response".to_string(),
            DETAIL_APPENDS.to_string(),
        )];
        let body = match self.get_json::<Value>(&path, &params).await {
            Ok(v) => v,
            Err(MediaError::Status { status: 404, .. }) => {
                return Err(MediaError::NotFound { media_type, id })
            }
            Err(e) => return Err(e),
        };
        parse_details(body, id, media_type)
    }

    async fn discover(&self, media_type: MediaType, filters: &FilterSet) -> Vec<ContentItem> {
        let path = format!("/discover/{}", media_type.as_path());
        let params = compose_discover_params(media_type, filters);
        self.fetch_list(&path, &params, Some(media_type)).await
    }

    async fn similar(&self, id: u64, media_type: MediaType) -> Vec<ContentItem> {
        let path = format!("/{}/{}/similar", media_type.as_path(), id);
        self.fetch_list(&path, &[], Some(media_type)).await
    }
}

fn first_page() -> Vec<(String, String)> {
    vec![("page".to_string(), "1".to_string())]
}

fn retry_delay() -> Duration {
    let jitter = u64::from(Utc::now().timestamp_subsec_millis()) % 300;
    Duration::from_millis(200 + jitter)
}

#[derive(Debug, Deserialize)]
struct ResultsPage {
    results: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Option<Vec<Genre>>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    id: Option<u64>,
    title: Option<String>,
    original_title: Option<String>,
    name: Option<String>,
    original_name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    genre_ids: Option<Vec<u32>>,
    genres: Option<Vec<Genre>>,
    runtime: Option<u32>,
    episode_run_time: Option<Vec<u32>>,
    media_type: Option<String>,
}

impl RawMedia {
    fn into_item(self, media_type: MediaType) -> Option<ContentItem> {
        let id = self.id?;
        let overview = self.overview.unwrap_or_default();
        let vote_average = self.vote_average.unwrap_or_default();
        let vote_count = self.vote_count.unwrap_or_default();
        let genre_ids = self.genre_ids.unwrap_or_default();
        let genres = self.genres.unwrap_or_default();
        let item = match media_type {
            MediaType::Movie => ContentItem::Movie(MovieItem {
                id,
                title: self
                    .title
                    .or_else(|| self.original_title.clone())
                    .unwrap_or_default(),
                original_title: self.original_title,
                overview,
                poster_path: self.poster_path,
                backdrop_path: self.backdrop_path,
                release_date: self.release_date.filter(|d| !d.is_empty()),
                vote_average,
                vote_count,
                genre_ids,
                genres,
                runtime: self.runtime.filter(|r| *r > 0),
            }),
            MediaType::Tv => ContentItem::Series(SeriesItem {
                id,
                name: self
                    .name
                    .or_else(|| self.original_name.clone())
                    .unwrap_or_default(),
                original_name: self.original_name,
                overview,
                poster_path: self.poster_path,
                backdrop_path: self.backdrop_path,
                first_air_date: self.first_air_date.filter(|d| !d.is_empty()),
                vote_average,
                vote_count,
                genre_ids,
                genres,
                episode_runtime: self
                    .episode_run_time
                    .and_then(|r| r.first().copied())
                    .filter(|r| *r > 0),
            }),
        };
        Some(item)
    }
}

/// `context` is the media type of a single-type endpoint; mixed endpoints
/// pass `None` and rely on each result's `media_type` tag. Results tagged
/// with anything else (e.g. `person`) are dropped.
fn parse_results(results: Vec<Value>, context: Option<MediaType>) -> Vec<ContentItem> {
    let total = results.len();
    let items: Vec<ContentItem> = results
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RawMedia>(value).ok())
        .filter_map(|raw| {
            let media_type = match context {
                Some(t) => t,
                None => raw.media_type.as_deref()?.parse().ok()?,
            };
            raw.into_item(media_type)
        })
        .collect();
    if items.len() < total {
        debug!("Dropped {} of {} results", total - items.len(), total);
    }
    items
}

fn parse_details(body: Value, id: u64, media_type: MediaType) -> Result<ContentItem, MediaError> {
    if body.get("success").and_then(|v| v.as_bool()) == Some(false) {
        return Err(MediaError::NotFound { media_type, id });
    }
    let raw: RawMedia = serde_json::from_value(body)
        .map_err(|e| MediaError::UpstreamEmpty(format!("details {}/{}: {}", media_type, id, e)))?;
    raw.into_item(media_type)
        .ok_or(MediaError::NotFound { media_type, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> TmdbClient {
        TmdbClient::new(
            "key",
            "ru-RU",
            "https://api.themoviedb.org/3/",
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[test]
    fn endpoint_url_encodes_params_after_credentials() {
        let url = client().endpoint_url(
            "/search/multi",
            &[("query".to_string(), "Бэтмен & Робин".to_string())],
        );
        assert!(url.starts_with(
            "https://api.themoviedb.org/3/search/multi?api_key=key&language=ru-RU&query="
        ));
        assert!(url.contains("%26"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn discover_url_carries_composed_filters() {
        let filters =
            FilterSet::new([16].into_iter().collect(), Some(2010), Some(2020), 7.0).unwrap();
        let url = client().endpoint_url(
            "/discover/tv",
            &compose_discover_params(MediaType::Tv, &filters),
        );
        assert!(url.contains("with_genres=16"));
        assert!(url.contains("first_air_date.gte=2010-01-01"));
        assert!(url.contains("first_air_date.lte=2020-12-31"));
        assert!(url.contains("vote_average.gte=7"));
    }

    #[test]
    fn mixed_results_use_upstream_tags_and_drop_people() {
        let results = vec![
            json!({ "id": 1, "title": "Movie", "media_type": "movie", "vote_average": 7.1 }),
            json!({ "id": 2, "name": "Show", "media_type": "tv", "first_air_date": "2011-04-17" }),
            json!({ "id": 3, "name": "Actor", "media_type": "person" }),
            json!({ "id": 4, "title": "Untagged" }),
        ];
        let items = parse_results(results, None);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].media_type(), MediaType::Movie);
        assert_eq!(items[1].media_type(), MediaType::Tv);
        assert_eq!(items[1].title(), "Show");
        assert_eq!(items[1].release_year(), Some(2011));
    }

    #[test]
    fn context_type_wins_over_field_shape() {
        // A series payload that happens to carry a "title" is still a series.
        let results = vec![json!({ "id": 5, "title": "Odd", "name": "Real Name" })];
        let items = parse_results(results, Some(MediaType::Tv));
        assert!(matches!(&items[0], ContentItem::Series(s) if s.name == "Real Name"));
    }

    #[test]
    fn missing_results_field_deserializes_to_none() {
        let page: ResultsPage = serde_json::from_value(json!({ "page": 1 })).unwrap();
        assert!(page.results.is_none());
    }

    #[test]
    fn details_are_enriched_with_genres_and_runtime() {
        let body = json!({
            "id": 1399,
            "name": "Game of Thrones",
            "overview": "Seven noble families...",
            "vote_average": 8.4,
            "vote_count": 22000,
            "genres": [{ "id": 18, "name": "Drama" }],
            "episode_run_time": [60],
            "first_air_date": "2011-04-17",
            "credits": { "cast": [] }
        });
        let item = parse_details(body, 1399, MediaType::Tv).unwrap();
        match item {
            ContentItem::Series(s) => {
                assert_eq!(s.genres[0].name, "Drama");
                assert_eq!(s.episode_runtime, Some(60));
            }
            other => panic!("expected series, got {:?}", other),
        }
    }

    #[test]
    fn error_envelope_is_not_found() {
        let body = json!({
            "success": false,
            "status_code": 34,
            "status_message": "The resource you requested could not be found."
        });
        let err = parse_details(body, 999_999_999, MediaType::Movie).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn retry_delay_stays_within_jitter_window() {
        let delay = retry_delay();
        assert!(delay >= Duration::from_millis(200));
        assert!(delay < Duration::from_millis(500));
    }
}
