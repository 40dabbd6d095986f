use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::config::Settings;
use crate::models::ContentItem;
use crate::tmdb::TmdbApi;

/// Latest published search. `token` identifies the input that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub token: u64,
    pub query: String,
    pub items: Vec<ContentItem>,
}

/// Debounced multi-search. Each input gets a fresh token; a pending dispatch
/// or in-flight response whose token is no longer the latest is dropped.
pub struct SearchDebouncer {
    tmdb: Arc<dyn TmdbApi>,
    delay: Duration,
    latest: Arc<AtomicU64>,
    tx: Arc<watch::Sender<SearchOutcome>>,
}

impl SearchDebouncer {
    pub fn new(tmdb: Arc<dyn TmdbApi>, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(SearchOutcome::default());
        Self {
            tmdb,
            delay,
            latest: Arc::new(AtomicU64::new(0)),
            tx: Arc::new(tx),
        }
    }

    /// Uses the configured `SEARCH_DEBOUNCE_MS` quiet period.
    pub fn from_settings(tmdb: Arc<dyn TmdbApi>, settings: &Settings) -> Self {
        Self::new(tmdb, settings.search_debounce)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchOutcome> {
        self.tx.subscribe()
    }

    pub fn latest_token(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Registers a keystroke and returns its token. Must be called from
    /// within a tokio runtime.
    pub fn input(&self, query: &str) -> u64 {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim().to_string();

        if query.is_empty() {
            self.tx.send_replace(SearchOutcome {
                token,
                query,
                items: Vec::new(),
            });
            return token;
        }

        let tmdb = Arc::clone(&self.tmdb);
        let latest = Arc::clone(&self.latest);
        let tx = Arc::clone(&self.tx);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::SeqCst) != token {
                debug!(token, "Search superseded before dispatch");
                return;
            }
            let items = tmdb.search_multi(&query).await;
            if latest.load(Ordering::SeqCst) != token {
                debug!(token, query = %query, "Discarding stale search response");
                return;
            }
            tx.send_replace(SearchOutcome {
                token,
                query,
                items,
            });
        });
        token
    }
}
