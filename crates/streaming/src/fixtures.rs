use std::path::{Path, PathBuf};

use tracing::debug;

use crate::resource::{BoxFuture, FetchError, RemoteResource};

/// Name of the raw input file inside a fixture directory.
pub const INPUT_FILE: &str = "input.osm";

/// Fixtures on the local filesystem: `<root>/<scenario>/<file>`.
#[derive(Debug, Clone)]
pub struct FixtureDir {
    root: PathBuf,
}

impl FixtureDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scenario names (directories holding an `input.osm`), sorted.
    pub async fn scenario_names(&self) -> Result<Vec<String>, FetchError> {
        let io_err = |source| FetchError::Io {
            path: self.root.clone(),
            source,
        };
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if !tokio::fs::try_exists(path.join(INPUT_FILE))
                .await
                .unwrap_or(false)
            {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl RemoteResource for FixtureDir {
    fn describe(&self) -> String {
        format!("fixtures at {:?}", self.root)
    }

    fn fetch(&self, name: &str) -> BoxFuture<'_, Result<String, FetchError>> {
        let path = self.root.join(name);
        let name = name.to_string();
        Box::pin(async move {
            debug!("reading fixture {path:?}");
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => Ok(text),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(FetchError::NotFound { name })
                }
                Err(source) => Err(FetchError::Io { path, source }),
            }
        })
    }
}
