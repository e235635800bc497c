use crate::error::OmicsError;

/// Splits `items` into consecutive chunks of `batch_size`; only the last
/// chunk may be shorter. Empty input yields no batches.
pub fn split<T>(items: &[T], batch_size: usize) -> Result<Vec<&[T]>, OmicsError> {
    if batch_size == 0 {
        return Err(OmicsError::Validation(
            "batch size must be at least 1".to_string(),
        ));
    }
    Ok(items.chunks(batch_size).collect())
}

/// Number of batches between two progress reports (roughly every 10%).
pub fn progress_stride(batch_count: usize) -> usize {
    (batch_count / 10).max(1)
}
