use thiserror::Error;

use crate::config::ApiLimits;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchValidationError {
    #[error("batch of {count} URLs exceeds limit of {limit}")]
    TooManyUrls { count: usize, limit: usize },
}

/// Check a decoded batch against the configured limits.
///
/// Individual URLs are not inspected here: a malformed URL is reported in
/// its own result rather than failing the whole request.
pub fn validate_batch(urls: &[String], limits: &ApiLimits) -> Result<(), BatchValidationError> {
    if urls.len() > limits.max_urls_per_batch {
        return Err(BatchValidationError::TooManyUrls {
            count: urls.len(),
            limit: limits.max_urls_per_batch,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_urls_per_batch: usize) -> ApiLimits {
        ApiLimits {
            max_urls_per_batch,
            ..ApiLimits::default()
        }
    }

    #[test]
    fn validate_batch_accepts_empty_and_malformed() {
        assert!(validate_batch(&[], &limits(1)).is_ok());
        assert!(validate_batch(&["not a url".to_string()], &limits(1)).is_ok());
    }

    #[test]
    fn validate_batch_enforces_limit() {
        let urls = vec!["https://a.example".to_string(); 3];

        assert!(validate_batch(&urls, &limits(3)).is_ok());
        assert_eq!(
            validate_batch(&urls, &limits(2)),
            Err(BatchValidationError::TooManyUrls { count: 3, limit: 2 })
        );
    }
}
