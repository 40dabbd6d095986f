use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for MediaType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(anyhow::anyhow!(
                "media type must be 'movie' or 'tv', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingScope {
    Movie,
    Tv,
    All,
}

impl TrendingScope {
    pub fn as_path(&self) -> &'static str {
        match self {
            TrendingScope::Movie => "movie",
            TrendingScope::Tv => "tv",
            TrendingScope::All => "all",
        }
    }

    /// The single media type this scope is restricted to, if any.
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            TrendingScope::Movie => Some(MediaType::Movie),
            TrendingScope::Tv => Some(MediaType::Tv),
            TrendingScope::All => None,
        }
    }
}

impl FromStr for TrendingScope {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Ok(TrendingScope::Movie),
            "tv" => Ok(TrendingScope::Tv),
            "all" => Ok(TrendingScope::All),
            other => Err(anyhow::anyhow!(
                "trending scope must be 'movie', 'tv' or 'all', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_path(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(TimeWindow::Day),
            "week" => Ok(TimeWindow::Week),
            other => Err(anyhow::anyhow!(
                "time window must be 'day' or 'week', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieItem {
    pub id: u64,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: f64,
    pub vote_count: u64,
    pub genre_ids: Vec<u32>,
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesItem {
    pub id: u64,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: f64,
    pub vote_count: u64,
    pub genre_ids: Vec<u32>,
    pub genres: Vec<Genre>,
    pub episode_runtime: Option<u32>,
}

/// A movie or series record. The variant comes from the request context or
/// the upstream `media_type` tag, never from which fields happen to be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    Movie(MovieItem),
    Series(SeriesItem),
}

impl ContentItem {
    pub fn id(&self) -> u64 {
        match self {
            ContentItem::Movie(m) => m.id,
            ContentItem::Series(s) => s.id,
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            ContentItem::Movie(_) => MediaType::Movie,
            ContentItem::Series(_) => MediaType::Tv,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentItem::Movie(m) => &m.title,
            ContentItem::Series(s) => &s.name,
        }
    }

    pub fn overview(&self) -> &str {
        match self {
            ContentItem::Movie(m) => &m.overview,
            ContentItem::Series(s) => &s.overview,
        }
    }

    pub fn poster_path(&self) -> Option<&str> {
        match self {
            ContentItem::Movie(m) => m.poster_path.as_deref(),
            ContentItem::Series(s) => s.poster_path.as_deref(),
        }
    }

    pub fn backdrop_path(&self) -> Option<&str> {
        match self {
            ContentItem::Movie(m) => m.backdrop_path.as_deref(),
            ContentItem::Series(s) => s.backdrop_path.as_deref(),
        }
    }

    pub fn vote_average(&self) -> f64 {
        match self {
            ContentItem::Movie(m) => m.vote_average,
            ContentItem::Series(s) => s.vote_average,
        }
    }

    pub fn genres(&self) -> &[Genre] {
        match self {
            ContentItem::Movie(m) => &m.genres,
            ContentItem::Series(s) => &s.genres,
        }
    }

    pub fn release_date(&self) -> Option<&str> {
        match self {
            ContentItem::Movie(m) => m.release_date.as_deref(),
            ContentItem::Series(s) => s.first_air_date.as_deref(),
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        self.release_date().and_then(extract_year)
    }

    /// Rating as shown on cards: one decimal.
    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.vote_average())
    }
}

fn extract_year(date: &str) -> Option<i32> {
    date.split('-')
        .next()
        .filter(|y| y.len() == 4)
        .and_then(|y| y.parse().ok())
}
