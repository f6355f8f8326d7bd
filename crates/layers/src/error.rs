use std::fmt;

use thiserror::Error;

/// Error produced by a layer producer (usually a failed engine export).
pub type ProducerError = Box<dyn std::error::Error + Send + Sync>;

/// A single layer whose payload could not be produced.
///
/// The entry stays registered, unmaterialized and hidden; sibling entries are
/// unaffected.
#[derive(Debug, Error)]
#[error("layer `{layer}` in group `{group}` failed to materialize: {source}")]
pub struct MaterializeError {
    pub group: String,
    pub layer: String,
    #[source]
    pub source: ProducerError,
}

/// Every materialization failure collected while applying one visibility change.
#[derive(Debug)]
pub struct MaterializeFailures {
    errors: Vec<MaterializeError>,
}

impl MaterializeFailures {
    /// `Ok(())` when nothing failed.
    pub fn check(errors: Vec<MaterializeError>) -> Result<(), MaterializeFailures> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }

    pub fn errors(&self) -> &[MaterializeError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<MaterializeError> for MaterializeFailures {
    fn from(err: MaterializeError) -> Self {
        Self { errors: vec![err] }
    }
}

impl IntoIterator for MaterializeFailures {
    type Item = MaterializeError;
    type IntoIter = std::vec::IntoIter<MaterializeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for MaterializeFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [only] => write!(f, "{only}"),
            errors => {
                write!(f, "{} layers failed to materialize", errors.len())?;
                for e in errors {
                    write!(f, "; {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for MaterializeFailures {}

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("no group named `{0}`")]
    GroupNotFound(String),
    #[error("no layer named `{layer}` in group `{group}`")]
    LayerNotFound { group: String, layer: String },
    #[error("a group named `{0}` is already registered")]
    DuplicateGroup(String),
    #[error("group `{group}` already has a layer named `{layer}`")]
    DuplicateLayer { group: String, layer: String },
    #[error("group `{0}` is a sequence, not a layer group")]
    NotALayerGroup(String),
    #[error("group `{0}` is not a sequence")]
    NotASequence(String),
    #[error("step {index} is out of range for `{group}` ({len} steps)")]
    StepOutOfRange {
        group: String,
        index: usize,
        len: usize,
    },
    #[error(transparent)]
    Materialize(#[from] MaterializeFailures),
}

impl From<MaterializeError> for LayerError {
    fn from(err: MaterializeError) -> Self {
        LayerError::Materialize(err.into())
    }
}
