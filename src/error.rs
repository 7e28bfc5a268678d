use thiserror::Error;

/// Failures raised while turning rows back into CSV text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid CSV dialect: {0}")]
    Dialect(String),
    #[error("CSV writer failed: {0}")]
    Encode(String),
    #[error("failed to format row {index}: {source}")]
    Row {
        index: usize,
        #[source]
        source: Box<FormatError>,
    },
}
