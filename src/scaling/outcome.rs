//! Result of one scale decision.

use std::time::Duration;

use crate::error::GatewayError;
use crate::routing::FunctionKey;

/// What the scaling collaborator reported for one function.
///
/// `available` only means something when `found` is set and `error` is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleOutcome {
    pub found: bool,
    pub available: bool,
    pub error: Option<String>,
    /// Total time spent inside the scale call.
    pub duration: Duration,
}

impl ScaleOutcome {
    pub fn ready(duration: Duration) -> Self {
        Self {
            found: true,
            available: true,
            error: None,
            duration,
        }
    }

    pub fn not_found(reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            found: false,
            available: false,
            error: Some(reason.into()),
            duration,
        }
    }

    pub fn failed(reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            found: true,
            available: false,
            error: Some(reason.into()),
            duration,
        }
    }

    pub fn timed_out(duration: Duration) -> Self {
        Self {
            found: true,
            available: false,
            error: None,
            duration,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.found && self.error.is_none() && self.available
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match (self.found, &self.error, self.available) {
            (false, _, _) => "not_found",
            (true, Some(_), _) => "error",
            (true, None, true) => "ready",
            (true, None, false) => "timeout",
        }
    }

    /// Map onto the gate's pass/block decision. `Ok` means forward the request.
    pub fn into_result(self, key: FunctionKey) -> Result<Duration, GatewayError> {
        match self {
            ScaleOutcome { found: false, error, .. } => Err(GatewayError::FunctionNotFound {
                key,
                reason: error.unwrap_or_else(|| "not found".to_string()),
            }),
            ScaleOutcome { error: Some(reason), .. } => Err(GatewayError::Scale { key, reason }),
            ScaleOutcome { available: true, duration, .. } => Ok(duration),
            ScaleOutcome { duration, .. } => Err(GatewayError::ScaleTimeout { key, elapsed: duration }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> FunctionKey {
        FunctionKey::new("figlet", "openfaas-fn")
    }

    #[test]
    fn test_not_found_ignores_available() {
        let outcome = ScaleOutcome {
            found: false,
            available: true,
            error: None,
            duration: Duration::ZERO,
        };
        assert_eq!(outcome.label(), "not_found");
        assert!(!outcome.is_ready());
        assert!(matches!(outcome.into_result(key()), Err(GatewayError::FunctionNotFound { .. })));
    }

    #[test]
    fn test_error_wins_over_available() {
        let outcome = ScaleOutcome {
            found: true,
            available: true,
            error: Some("boom".into()),
            duration: Duration::ZERO,
        };
        assert_eq!(outcome.label(), "error");
        assert!(matches!(outcome.into_result(key()), Err(GatewayError::Scale { .. })));
    }

    #[test]
    fn test_ready_passes() {
        let outcome = ScaleOutcome::ready(Duration::from_millis(7));
        assert!(outcome.is_ready());
        assert_eq!(outcome.into_result(key()).unwrap(), Duration::from_millis(7));
    }

    #[test]
    fn test_unavailable_is_timeout() {
        let outcome = ScaleOutcome::timed_out(Duration::from_secs(3));
        assert_eq!(outcome.label(), "timeout");
        match outcome.into_result(key()) {
            Err(GatewayError::ScaleTimeout { elapsed, .. }) => assert_eq!(elapsed, Duration::from_secs(3)),
            other => panic!("unexpected {:?}", other),
        }
    }
}
