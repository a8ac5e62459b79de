use thiserror::Error;

/// Failures while retrieving the published sheet.
///
/// Every variant is recoverable from the cache's point of view: the previous
/// snapshot keeps serving until a later refresh succeeds.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("redirect {status} from {url} has no Location header")]
    MissingLocation { status: u16, url: String },

    #[error("too many redirects fetching {url}: exceeded {max_redirects} hops")]
    TooManyRedirects { url: String, max_redirects: usize },

    #[error("invalid sheet URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
