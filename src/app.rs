use crate::config::Settings;
use crate::error::MediaError;
use crate::filters::{AppliedFilters, FilterSet, YEAR_FLOOR};
use crate::home::load_home;
use crate::links::{image_url, player_url, ImageSize};
use crate::models::{ContentItem, MediaType, TimeWindow, TrendingScope};
use crate::selector::{resolve_source, Category, Selection, Source};
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const SIMILAR_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
    pub settings: Arc<Settings>,
}

pub async fn run_server(settings: Settings) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_settings(&settings)?);
    info!(
        "Using TMDB at {} with language {}",
        settings.tmdb_base_url, settings.language
    );
    let addr = settings.bind_addr;
    let state = AppState {
        tmdb,
        settings: Arc::new(settings),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home))
        .route("/api/browse", get(browse))
        .route("/api/trending/:scope/:window", get(trending))
        .route("/api/popular/:media_type", get(popular))
        .route("/api/top_rated/:media_type", get(top_rated))
        .route("/api/search", get(search))
        .route("/api/genres/:media_type", get(genres))
        .route("/api/discover/:media_type", get(discover))
        .route("/api/details/:media_type/:id", get(details))
        .route("/api/watch/:media_type/:id", get(watch))
        .route("/api/filters/defaults", get(filter_defaults))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Filter fields shared by `/api/browse` and `/api/discover`.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub genres: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_rating: Option<f64>,
}

impl FilterQuery {
    /// Years must fall within `1950..=current_year`, as on the filter panel.
    fn to_filter_set(&self, current_year: i32) -> Result<FilterSet, String> {
        let mut genre_ids = BTreeSet::new();
        for part in self.genres.as_deref().unwrap_or_default().split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let id = part
                .parse::<u32>()
                .map_err(|_| format!("invalid genre id '{}'", part))?;
            genre_ids.insert(id);
        }
        let filters = FilterSet::new(
            genre_ids,
            self.year_from,
            self.year_to,
            self.min_rating.unwrap_or(0.0),
        )
        .map_err(|e| e.to_string())?;
        filters
            .check_year_bounds(current_year)
            .map_err(|e| e.to_string())?;
        Ok(filters)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub media_type: Option<String>,
    pub genres: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
struct WatchPage {
    item: ContentItem,
    rating: String,
    player_url: String,
    poster_url: String,
    backdrop_url: String,
    similar: Vec<ContentItem>,
}

fn bad_request(message: impl Into<String>) -> Response {
    let message = message.into();
    warn!("Rejecting request: {}", message);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "error", "message": message})),
    )
        .into_response()
}

fn media_error_response(err: MediaError) -> Response {
    if err.is_not_found() {
        info!("{}", err);
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "not_found", "message": err.to_string(), "home": "/"})),
        )
            .into_response();
    }
    error!("Upstream failure: {}", err);
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({"status": "error", "message": err.to_string()})),
    )
        .into_response()
}

fn parse_media_type(raw: &str) -> Result<MediaType, Response> {
    raw.parse::<MediaType>().map_err(|e| bad_request(e.to_string()))
}

fn parse_id(raw: &str) -> Result<u64, Response> {
    raw.parse::<u64>()
        .map_err(|_| bad_request(format!("id must be a positive integer, got '{}'", raw)))
}

async fn home(State(state): State<AppState>) -> Response {
    Json(load_home(state.tmdb.as_ref()).await).into_response()
}

async fn browse(State(state): State<AppState>, Query(params): Query<BrowseQuery>) -> Response {
    let category = match params.category.as_deref().unwrap_or_default().parse::<Category>() {
        Ok(c) => c,
        Err(e) => return bad_request(e.to_string()),
    };
    let filter_query = FilterQuery {
        genres: params.genres.clone(),
        year_from: params.year_from,
        year_to: params.year_to,
        min_rating: params.min_rating,
    };
    let filters = match filter_query.to_filter_set(state.settings.current_year) {
        Ok(f) => f,
        Err(message) => return bad_request(message),
    };
    let mut applied = AppliedFilters {
        media_type: match category {
            Category::Series => MediaType::Tv,
            Category::All | Category::Movies => MediaType::Movie,
        },
        filters,
    };
    let query = params.q.unwrap_or_default();

    let source = resolve_source(&query, Some(&applied), category);
    // media_type only matters for filtered discovery.
    if source == Source::Filtered {
        if let Some(raw) = params.media_type.as_deref() {
            applied.media_type = match parse_media_type(raw) {
                Ok(t) => t,
                Err(res) => return res,
            };
        }
    }
    let tmdb = state.tmdb.as_ref();
    let items = match source {
        Source::Search => tmdb.search_multi(query.trim()).await,
        Source::Filtered => tmdb.discover(applied.media_type, &applied.filters).await,
        Source::Category(Category::All) => {
            tmdb.trending(TrendingScope::All, TimeWindow::Week).await
        }
        Source::Category(Category::Movies) => tmdb.popular(MediaType::Movie).await,
        Source::Category(Category::Series) => tmdb.popular(MediaType::Tv).await,
    };
    Json(Selection {
        source,
        items: &items,
    })
    .into_response()
}

async fn trending(
    State(state): State<AppState>,
    Path((scope, window)): Path<(String, String)>,
) -> Response {
    let scope = match scope.parse::<TrendingScope>() {
        Ok(s) => s,
        Err(e) => return bad_request(e.to_string()),
    };
    let window = match window.parse::<TimeWindow>() {
        Ok(w) => w,
        Err(e) => return bad_request(e.to_string()),
    };
    Json(state.tmdb.trending(scope, window).await).into_response()
}

async fn popular(State(state): State<AppState>, Path(media_type): Path<String>) -> Response {
    match parse_media_type(&media_type) {
        Ok(t) => Json(state.tmdb.popular(t).await).into_response(),
        Err(res) => res,
    }
}

async fn top_rated(State(state): State<AppState>, Path(media_type): Path<String>) -> Response {
    match parse_media_type(&media_type) {
        Ok(t) => Json(state.tmdb.top_rated(t).await).into_response(),
        Err(res) => res,
    }
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchQuery>) -> Response {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Json(Vec::<ContentItem>::new()).into_response();
    }
    Json(state.tmdb.search_multi(query.trim()).await).into_response()
}

async fn genres(State(state): State<AppState>, Path(media_type): Path<String>) -> Response {
    match parse_media_type(&media_type) {
        Ok(t) => Json(state.tmdb.genres(t).await).into_response(),
        Err(res) => res,
    }
}

async fn discover(
    State(state): State<AppState>,
    Path(media_type): Path<String>,
    Query(params): Query<FilterQuery>,
) -> Response {
    let media_type = match parse_media_type(&media_type) {
        Ok(t) => t,
        Err(res) => return res,
    };
    let filters = match params.to_filter_set(state.settings.current_year) {
        Ok(f) => f,
        Err(message) => return bad_request(message),
    };
    Json(state.tmdb.discover(media_type, &filters).await).into_response()
}

async fn details(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
) -> Response {
    let (media_type, id) = match (parse_media_type(&media_type), parse_id(&id)) {
        (Ok(t), Ok(id)) => (t, id),
        (Err(res), _) | (_, Err(res)) => return res,
    };
    match state.tmdb.details(id, media_type).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => media_error_response(e),
    }
}

async fn watch(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
) -> Response {
    let (media_type, id) = match (parse_media_type(&media_type), parse_id(&id)) {
        (Ok(t), Ok(id)) => (t, id),
        (Err(res), _) | (_, Err(res)) => return res,
    };
    let (item, mut similar) = tokio::join!(
        state.tmdb.details(id, media_type),
        state.tmdb.similar(id, media_type),
    );
    let item = match item {
        Ok(item) => item,
        Err(e) => return media_error_response(e),
    };
    similar.truncate(SIMILAR_LIMIT);

    let settings = &state.settings;
    let page = WatchPage {
        rating: item.rating_label(),
        player_url: player_url(&settings.player_base_url, media_type, id),
        poster_url: image_url(&settings.image_base_url, item.poster_path(), ImageSize::Medium),
        backdrop_url: image_url(
            &settings.image_base_url,
            item.backdrop_path(),
            ImageSize::Original,
        ),
        item,
        similar,
    };
    Json(page).into_response()
}

async fn filter_defaults(State(state): State<AppState>) -> Response {
    let year = state.settings.current_year;
    Json(json!({
        "filters": FilterSet::unfiltered(year),
        "year_min": YEAR_FLOOR,
        "year_max": year,
        "rating_min": 0.0,
        "rating_max": 10.0,
        "rating_step": 0.5,
    }))
    .into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
