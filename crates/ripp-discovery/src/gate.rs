//! Dual opt-in for AI discovery
//!
//! Inference runs only when the configuration file enables it *and* the
//! invocation enables it at runtime.

use crate::error::DiscoveryError;
use ripp_core::AiConfig;

/// Environment variable carrying the runtime half of the opt-in
pub const AI_ENABLED_ENV: &str = "RIPP_AI_ENABLED";

/// Interpret a runtime flag value
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Runtime opt-in from [`AI_ENABLED_ENV`]
#[must_use]
pub fn runtime_enabled_from_env() -> bool {
    std::env::var(AI_ENABLED_ENV).is_ok_and(|v| parse_flag(&v))
}

/// Refuse to run unless both halves of the opt-in are present
///
/// # Errors
/// Returns [`DiscoveryError::Disabled`] naming the missing halves
pub fn ensure_ai_enabled(ai: &AiConfig, runtime_enabled: bool) -> Result<(), DiscoveryError> {
    if ai.enabled && runtime_enabled {
        Ok(())
    } else {
        tracing::warn!(
            config_enabled = ai.enabled,
            runtime_enabled,
            "AI discovery refused"
        );
        Err(DiscoveryError::Disabled {
            config_enabled: ai.enabled,
            runtime_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_halves_are_required() {
        let mut ai = AiConfig::default();
        assert!(ensure_ai_enabled(&ai, true).is_err());
        ai.enabled = true;
        assert!(ensure_ai_enabled(&ai, false).is_err());
        assert!(ensure_ai_enabled(&ai, true).is_ok());
    }

    #[test]
    fn flag_values() {
        for yes in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(yes), "{yes}");
        }
        for no in ["", "0", "false", "enabled"] {
            assert!(!parse_flag(no), "{no}");
        }
    }
}
