use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraceError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Failure of a single relay request. Every variant is terminal for that request.
///
/// The `Display` text is for operators and may carry detail; clients only ever
/// see [`RelayError::kind`].
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream protocol error: {0}")]
    UpstreamProtocol(String),
}

impl RelayError {
    /// Opaque error kind returned to clients in `{"error": kind}`.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::BadRequest(_) => "bad_request",
            RelayError::Configuration(_) => "configuration_error",
            RelayError::Upstream(_) => "upstream_error",
            RelayError::UpstreamProtocol(_) => "upstream_protocol_error",
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        // Strip the URL so query-string credentials can never reach a log line.
        let e = e.without_url();
        if e.is_timeout() {
            RelayError::Upstream(format!("timeout: {}", e))
        } else {
            RelayError::Upstream(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            RelayError::BadRequest("x".into()).kind(),
            RelayError::Configuration("x".into()).kind(),
            RelayError::Upstream("x".into()).kind(),
            RelayError::UpstreamProtocol("x".into()).kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_kind_does_not_carry_detail() {
        let err = RelayError::Upstream("connection reset by api.example.com".into());
        assert_eq!(err.kind(), "upstream_error");
        assert!(err.to_string().contains("connection reset"));
    }
}
