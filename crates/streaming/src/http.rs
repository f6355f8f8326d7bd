use tracing::debug;

use crate::resource::{BoxFuture, FetchError, RemoteResource};

/// Fixtures served over HTTP: `GET <base>/<name>`.
pub struct HttpResource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpResource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn url_for(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            name.trim_start_matches('/')
        )
    }
}

impl RemoteResource for HttpResource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn fetch(&self, name: &str) -> BoxFuture<'_, Result<String, FetchError>> {
        let url = self.url_for(name);
        let name = name.to_string();
        Box::pin(async move {
            debug!("GET {url}");
            let resp = get_text(&self.client, &url).await;
            match resp {
                Err(FetchError::Status { status: 404, .. }) => Err(FetchError::NotFound { name }),
                other => other,
            }
        })
    }
}

/// Sends a GET and reads the body as text, mapping non-2xx statuses to errors.
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let transport = |source| FetchError::Transport {
        url: url.to_string(),
        source,
    };
    let resp = client.get(url).send().await.map_err(transport)?;
    if !resp.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }
    resp.text().await.map_err(transport)
}

#[cfg(test)]
mod tests {
    use super::HttpResource;

    #[test]
    fn joins_base_and_name_with_one_slash() {
        let r = HttpResource::new("http://localhost:8000/tests/");
        assert_eq!(
            r.url_for("/arizona_highways/input.osm"),
            "http://localhost:8000/tests/arizona_highways/input.osm"
        );
        let r = HttpResource::new("http://localhost:8000/tests");
        assert_eq!(
            r.url_for("arizona_highways/geometry.json"),
            "http://localhost:8000/tests/arizona_highways/geometry.json"
        );
    }
}
