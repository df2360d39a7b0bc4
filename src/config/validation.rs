use super::models::Config;
use crate::humanize::ByteSize;
use thiserror::Error;

/// Hard ceiling for a single request body
pub const MAX_PAYLOAD_CEILING: ByteSize = ByteSize::mib(5);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("engine.{field} must be at least 1")]
    ZeroEngineSetting { field: &'static str },

    #[error(
        "engine.connect_timeout_secs ({connect}) exceeds engine.request_timeout_secs ({request})"
    )]
    ConnectTimeoutExceedsRequest { connect: u64, request: u64 },

    #[error("engine.user_agent must not be empty")]
    EmptyUserAgent,

    #[error("max_payload_bytes ({actual}) exceeds limit of {limit}")]
    PayloadSizeExceedsLimit { actual: ByteSize, limit: ByteSize },

    #[error("max_payload_bytes must be positive")]
    ZeroPayloadSize,

    #[error("max_urls_per_batch must be at least 1")]
    ZeroBatchSize,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_engine(config)?;
    validate_api_limits(config)?;
    Ok(())
}

fn validate_engine(config: &Config) -> Result<(), ValidationError> {
    let engine = &config.engine;

    let non_zero = [
        ("workers", engine.workers as u64),
        ("queue_capacity", engine.queue_capacity as u64),
        ("request_timeout_secs", engine.request_timeout_secs),
        ("connect_timeout_secs", engine.connect_timeout_secs),
    ];
    if let Some((field, _)) = non_zero.into_iter().find(|(_, value)| *value == 0) {
        return Err(ValidationError::ZeroEngineSetting { field });
    }

    if engine.connect_timeout_secs > engine.request_timeout_secs {
        return Err(ValidationError::ConnectTimeoutExceedsRequest {
            connect: engine.connect_timeout_secs,
            request: engine.request_timeout_secs,
        });
    }

    if engine.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }

    Ok(())
}

fn validate_api_limits(config: &Config) -> Result<(), ValidationError> {
    let api = &config.server.api;

    if api.max_payload_bytes.as_u64() == 0 {
        return Err(ValidationError::ZeroPayloadSize);
    }

    if api.max_payload_bytes > MAX_PAYLOAD_CEILING {
        return Err(ValidationError::PayloadSizeExceedsLimit {
            actual: api.max_payload_bytes,
            limit: MAX_PAYLOAD_CEILING,
        });
    }

    if api.max_urls_per_batch == 0 {
        return Err(ValidationError::ZeroBatchSize);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_workers() {
        let mut config = Config::default();
        config.engine.workers = 0;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::ZeroEngineSetting { field: "workers" })
        ));
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut config = Config::default();
        config.engine.queue_capacity = 0;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::ZeroEngineSetting { field: "queue_capacity" })
        ));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.engine.request_timeout_secs = 0;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::ZeroEngineSetting { field: "request_timeout_secs" })
        ));
    }

    #[test]
    fn test_connect_timeout_longer_than_request() {
        let mut config = Config::default();
        config.engine.request_timeout_secs = 5;
        config.engine.connect_timeout_secs = 10;

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::ConnectTimeoutExceedsRequest { connect: 10, request: 5 })
        ));
    }

    #[test]
    fn test_empty_user_agent() {
        let mut config = Config::default();
        config.engine.user_agent = "  ".to_string();

        assert!(matches!(validate(&config), Err(ValidationError::EmptyUserAgent)));
    }

    #[test]
    fn test_payload_size_limit() {
        let mut config = Config::default();
        config.server.api.max_payload_bytes = ByteSize::mib(10);

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::PayloadSizeExceedsLimit { .. })
        ));
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = Config::default();
        config.server.api.max_urls_per_batch = 0;

        assert!(matches!(validate(&config), Err(ValidationError::ZeroBatchSize)));
    }
}
