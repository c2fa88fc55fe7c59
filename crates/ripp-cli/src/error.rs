//! Stage failures carried through `anyhow`

use ripp_core::{Diagnose, ErrorKind};
use std::fmt::{self, Display, Formatter};

/// A stage error with its class and remediation hint
#[derive(Debug)]
pub struct Failure {
    /// Failure class
    pub kind: ErrorKind,
    /// Suggested fix
    pub hint: Option<String>,
    error: anyhow::Error,
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

impl std::error::Error for Failure {}

/// Wrap a stage error, keeping its kind and hint
pub fn diagnosed<E>(err: E) -> anyhow::Error
where
    E: Diagnose + Send + Sync + 'static,
{
    anyhow::Error::new(Failure {
        kind: err.kind(),
        hint: err.hint(),
        error: anyhow::Error::new(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripp_core::ConfigError;

    #[test]
    fn hint_survives_wrapping() {
        let err = diagnosed(ConfigError::invalid("ai.max_retries", "must be >= 1"));
        let failure = err.downcast_ref::<Failure>().unwrap();
        assert_eq!(failure.kind, ErrorKind::Config);
        assert!(failure.hint.as_deref().unwrap().contains("ai.max_retries"));
        assert!(err.to_string().contains("must be >= 1"));
    }
}
