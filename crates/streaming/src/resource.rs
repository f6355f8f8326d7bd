use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{name} not found")]
    NotFound { name: String },
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid request url for {name}: {reason}")]
    InvalidUrl { name: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// A source of named text payloads (fixture files, HTTP paths, remote queries).
///
/// Implementations must be `Send + Sync`; methods return boxed futures for
/// dyn-compatibility. A fetch either yields the whole body or fails; there are
/// no partial results and no retries.
pub trait RemoteResource: Send + Sync {
    /// Short description used in logs.
    fn describe(&self) -> String;

    fn fetch(&self, name: &str) -> BoxFuture<'_, Result<String, FetchError>>;
}
