use serde::Serialize;
use tracing::{info, warn};

use crate::models::{ContentItem, MediaType, TimeWindow, TrendingScope};
use crate::tmdb::TmdbApi;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HomeSections {
    pub trending: Vec<ContentItem>,
    pub popular_movies: Vec<ContentItem>,
    pub popular_series: Vec<ContentItem>,
}

/// Loads the three home sections concurrently. Each source stands alone:
/// one coming back empty does not hold back the others.
pub async fn load_home(tmdb: &dyn TmdbApi) -> HomeSections {
    let (trending, popular_movies, popular_series) = tokio::join!(
        tmdb.trending(TrendingScope::All, TimeWindow::Week),
        tmdb.popular(MediaType::Movie),
        tmdb.popular(MediaType::Tv),
    );

    for (name, items) in [
        ("trending", &trending),
        ("popular movies", &popular_movies),
        ("popular series", &popular_series),
    ] {
        if items.is_empty() {
            warn!("Home section '{}' is empty", name);
        }
    }
    info!(
        "Loaded home: {} trending, {} movies, {} series",
        trending.len(),
        popular_movies.len(),
        popular_series.len()
    );

    HomeSections {
        trending,
        popular_movies,
        popular_series,
    }
}
