use foundation::GeoBounds;
use tracing::info;

use crate::http::get_text;
use crate::resource::{BoxFuture, FetchError, RemoteResource};

pub const DEFAULT_OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Overpass QL for every node, way and relation in `bounds`, plus the nodes of
/// those ways and everything referencing them, with metadata.
pub fn overpass_query(bounds: &GeoBounds) -> String {
    format!("(nwr({bounds}); node(w)->.x; <;); out meta;")
}

/// An Overpass interpreter endpoint. The fetched "name" is the query text,
/// sent as the `data` parameter.
pub struct OverpassResource {
    endpoint: String,
    client: reqwest::Client,
}

impl OverpassResource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request_url(&self, query: &str) -> Result<reqwest::Url, FetchError> {
        reqwest::Url::parse_with_params(&self.endpoint, &[("data", query)]).map_err(|e| {
            FetchError::InvalidUrl {
                name: self.endpoint.clone(),
                reason: e.to_string(),
            }
        })
    }

    /// Raw OSM XML for `bounds`.
    pub async fn fetch_bounds(&self, bounds: &GeoBounds) -> Result<String, FetchError> {
        self.fetch(&overpass_query(bounds)).await
    }
}

impl Default for OverpassResource {
    fn default() -> Self {
        Self::new(DEFAULT_OVERPASS_ENDPOINT)
    }
}

impl RemoteResource for OverpassResource {
    fn describe(&self) -> String {
        format!("overpass at {}", self.endpoint)
    }

    fn fetch(&self, query: &str) -> BoxFuture<'_, Result<String, FetchError>> {
        let url = self.request_url(query);
        Box::pin(async move {
            let url = url?;
            info!("fetching from overpass: {url}");
            get_text(&self.client, url.as_str()).await
        })
    }
}
