use thiserror::Error;

use crate::models::MediaType;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("unexpected upstream payload: {0}")]
    UpstreamEmpty(String),

    #[error("{media_type} {id} not found")]
    NotFound { media_type: MediaType, id: u64 },
}

impl MediaError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MediaError::NotFound { .. })
    }

    /// Connect failures and timeouts; HTTP statuses are never transport errors.
    pub fn is_transport(&self) -> bool {
        match self {
            MediaError::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("year range is inverted: {from} > {to}")]
    YearOrder { from: i32, to: i32 },

    #[error("year {0} is outside {1}..={2}")]
    YearOutOfRange(i32, i32, i32),

    #[error("minimum rating {0} must be within 0..=10 in steps of 0.5")]
    Rating(f64),
}
