//! Error types for the mapping layer
use thiserror::Error;

/// Errors raised while translating between entities and stored rows.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RowError {
    /// Serialization of a row failed.
    #[error("Serialization failed for table '{table}'")]
    SerializationFailed {
        /// The table the row was destined for
        table: &'static str,
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization of a stored row failed.
    #[error("Deserialization failed for table '{table}'")]
    DeserializationFailed {
        /// The table the row was read from
        table: &'static str,
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// A marker row held something other than a well-formed identifier.
    #[error("Corrupt marker in table '{table}'")]
    CorruptMarker {
        /// The marker table the value was read from
        table: String,
    },
}

impl RowError {
    /// Check if this error is a serialization failure.
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, RowError::SerializationFailed { .. })
    }

    /// Check if this error indicates corrupt stored data.
    pub fn is_corruption_error(&self) -> bool {
        matches!(
            self,
            RowError::DeserializationFailed { .. } | RowError::CorruptMarker { .. }
        )
    }
}

// Conversion from RowError to the main Error type
impl From<RowError> for crate::Error {
    fn from(err: RowError) -> Self {
        crate::Error::Row(err)
    }
}
