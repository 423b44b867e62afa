use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum GraphError {
    #[error("Invalid relation registry: {0}")]
    InvalidRegistry(String),
    #[error("Fieldset type mismatch on `{id_field}`: `{left}` vs `{right}`")]
    FieldsetMismatch {
        id_field: String,
        left: String,
        right: String,
    },
    #[error("Unknown relation `{field}` on collection `{collection}`")]
    UnknownRelation { collection: String, field: String },
    #[error("Model request mismatch: {0}")]
    RequestMismatch(String),
    #[error("Malformed value for `{field}`: {reason}")]
    MalformedValue { field: String, reason: String },
    #[error("Invalid FQID '{0}', expected `collection/id`")]
    InvalidFqid(String),
    #[error("Reverse index inconsistency: {0}")]
    IndexInconsistent(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
}

impl GraphError {
    /// True for errors raised while assembling the relation registry. These are static
    /// defects of the relation table, never runtime conditions.
    pub fn is_configuration(&self) -> bool {
        matches!(self, GraphError::InvalidRegistry(_))
    }
}

impl From<JsonError> for GraphError {
    fn from(src: JsonError) -> GraphError {
        GraphError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<toml::de::Error> for GraphError {
    fn from(src: toml::de::Error) -> GraphError {
        GraphError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for GraphError {
    fn from(src: toml::ser::Error) -> GraphError {
        GraphError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<io::Error> for GraphError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => GraphError::NotFound(format!("{x}")),
            _ => GraphError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fieldset_mismatch_display() {
        let err = GraphError::FieldsetMismatch {
            id_field: "motion_ids".to_string(),
            left: "detail".to_string(),
            right: "list".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Fieldset type mismatch on `motion_ids`: `detail` vs `list`"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: GraphError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, GraphError::NotFound(_)));
    }
}
