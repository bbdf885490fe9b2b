use thiserror::Error;

/// Fatal failures for one document. Expected absences (a heading or marker
/// that simply is not on the page) are reported as [`crate::ExtractWarning`]s
/// instead, so the pipeline can fall back to templates.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The external page/word/table provider failed while the document was
    /// being materialized. Fatal for this document only.
    #[error("page provider failed: {0}")]
    Provider(String),

    #[error("invalid operator schema: {0}")]
    InvalidSchema(String),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}
