/// Failures the engine can actually raise.
///
/// Malformed data never errors; the pipeline degrades row by row instead.
/// Only CSV framing problems in the raw input streams surface here. Feed
/// I/O belongs to callers, so there is no I/O variant.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
}
