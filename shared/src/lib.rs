// shared/src/lib.rs

/// Why a call to the movie-data provider did not produce a usable answer.
///
/// Callers treat every variant as "upstream unavailable"; the variant only
/// refines logging and the HTTP status chosen at the edge.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// Connection refused, DNS failure, reset, ...
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    /// Provider answered with a non-2xx status.
    #[error("provider returned status {0}")]
    Status(u16),
    /// Body could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(UpstreamFailure),
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    pub fn upstream(failure: UpstreamFailure) -> Self {
        Error::UpstreamUnavailable(failure)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
