#![allow(dead_code)]

use cinemax::config::Settings;
use cinemax::error::MediaError;
use cinemax::filters::{compose_discover_params, FilterSet};
use cinemax::models::{
    ContentItem, Genre, MediaType, MovieItem, SeriesItem, TimeWindow, TrendingScope,
};
use cinemax::tmdb::TmdbApi;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const MISSING_ID: u64 = 404_404;

pub fn movie(id: u64, title: &str) -> ContentItem {
    ContentItem::Movie(MovieItem {
        id,
        title: title.to_string(),
        original_title: None,
        overview: format!("{title} overview"),
        poster_path: None,
        backdrop_path: Some(format!("/backdrop-{id}.jpg")),
        release_date: Some("2014-11-05".to_string()),
        vote_average: 8.44,
        vote_count: 1200,
        genre_ids: vec![12, 18],
        genres: Vec::new(),
        runtime: None,
    })
}

pub fn series(id: u64, name: &str) -> ContentItem {
    ContentItem::Series(SeriesItem {
        id,
        name: name.to_string(),
        original_name: None,
        overview: format!("{name} overview"),
        poster_path: Some(format!("/poster-{id}.jpg")),
        backdrop_path: None,
        first_air_date: Some("2011-04-17".to_string()),
        vote_average: 8.0,
        vote_count: 900,
        genre_ids: vec![16],
        genres: Vec::new(),
        episode_runtime: None,
    })
}

/// Records every upstream call as a short string, e.g. `popular movie`.
#[derive(Default)]
pub struct FakeTmdb {
    pub calls: Mutex<Vec<String>>,
    pub search_delays: HashMap<String, Duration>,
    pub empty_popular_movies: bool,
}

impl FakeTmdb {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("search ").map(|q| q.to_string()))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    async fn trending(&self, scope: TrendingScope, window: TimeWindow) -> Vec<ContentItem> {
        self.record(format!("trending {} {}", scope.as_path(), window.as_path()));
        vec![movie(1, "Interstellar"), series(2, "Arcane")]
    }

    async fn popular(&self, media_type: MediaType) -> Vec<ContentItem> {
        self.record(format!("popular {}", media_type));
        match media_type {
            MediaType::Movie if self.empty_popular_movies => Vec::new(),
            MediaType::Movie => vec![movie(3, "Dune"), movie(4, "Inception")],
            MediaType::Tv => vec![series(5, "Dark")],
        }
    }

    async fn top_rated(&self, media_type: MediaType) -> Vec<ContentItem> {
        self.record(format!("top_rated {}", media_type));
        vec![movie(6, "The Shawshank Redemption")]
    }

    async fn search_multi(&self, query: &str) -> Vec<ContentItem> {
        self.record(format!("search {}", query));
        if let Some(delay) = self.search_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        vec![movie(100, query)]
    }

    async fn genres(&self, media_type: MediaType) -> Vec<Genre> {
        self.record(format!("genres {}", media_type));
        vec![
            Genre {
                id: 16,
                name: "Animation".to_string(),
            },
            Genre {
                id: 18,
                name: "Drama".to_string(),
            },
        ]
    }

    async fn details(&self, id: u64, media_type: MediaType) -> Result<ContentItem, MediaError> {
        self.record(format!("details {} {}", media_type, id));
        if id == MISSING_ID {
            return Err(MediaError::NotFound { media_type, id });
        }
        Ok(match media_type {
            MediaType::Movie => movie(id, "Detailed Movie"),
            MediaType::Tv => series(id, "Detailed Series"),
        })
    }

    async fn discover(&self, media_type: MediaType, filters: &FilterSet) -> Vec<ContentItem> {
        let params = compose_discover_params(media_type, filters)
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        self.record(format!("discover {} {}", media_type, params));
        vec![series(7, "Avatar: The Last Airbender")]
    }

    async fn similar(&self, id: u64, media_type: MediaType) -> Vec<ContentItem> {
        self.record(format!("similar {} {}", media_type, id));
        (0..12).map(|i| movie(1000 + i, "Similar")).collect()
    }
}

pub fn test_settings() -> Settings {
    Settings {
        tmdb_api_key: "test-key".to_string(),
        language: "ru-RU".to_string(),
        tmdb_base_url: "http://127.0.0.1:9".to_string(),
        image_base_url: "https://image.tmdb.org/t/p".to_string(),
        player_base_url: "https://player.example".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        current_year: 2026,
        search_debounce: Duration::from_millis(500),
        http_timeout: Duration::from_secs(5),
    }
}
