//! Credential redaction
//!
//! Best effort: every snippet and version string passes through the
//! [`Redactor`] before it is retained, and each signal records whether
//! anything was replaced.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum retained snippet length, in characters
pub const MAX_SNIPPET_CHARS: usize = 200;

/// Replacement marker
pub const REDACTED: &str = "[REDACTED]";

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

static BUILTIN: Lazy<Vec<Rule>> = Lazy::new(|| {
    let rule = |pattern: &str, replacement: &'static str| Rule {
        pattern: Regex::new(pattern).expect("valid redaction regex"),
        replacement,
    };
    vec![
        rule(r"-----BEGIN [A-Z ]*PRIVATE KEY-----[\s\S]*?(-----END [A-Z ]*PRIVATE KEY-----|$)", REDACTED),
        rule(r"\bAKIA[0-9A-Z]{16}\b", REDACTED),
        rule(r"\bgh[pousr]_[A-Za-z0-9]{20,}\b", REDACTED),
        rule(r"\bsk-[A-Za-z0-9_\-]{16,}", REDACTED),
        rule(r"\beyJ[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]{8,}\.[A-Za-z0-9_\-]{8,}", REDACTED),
        rule(r"(?i)\b(bearer|basic)\s+[A-Za-z0-9\-._~+/]{8,}=*", "${1} [REDACTED]"),
        rule(r"://[^/\s:@]+:[^/\s@]+@", "://[REDACTED]@"),
        rule(
            r#"(?i)\b([A-Za-z0-9_]*(?:api[_\-]?key|secret|token|passw(?:or)?d|pwd|access[_\-]?key|private[_\-]?key|client[_\-]?secret)[A-Za-z0-9_]*["']?\s*[:=]\s*)["']?[^"'\s,;]{4,}["']?"#,
            "${1}[REDACTED]",
        ),
    ]
});

/// Output of one redaction pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redacted {
    /// Text with credentials replaced
    pub text: String,
    /// Whether any replacement happened
    pub redacted: bool,
}

/// Pattern-based credential scrubber
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    extra: Vec<Regex>,
}

impl Redactor {
    /// Built-in patterns plus configured extras
    ///
    /// # Errors
    /// Returns the first extra pattern that fails to compile
    pub fn new(extra: &[String]) -> Result<Self, (String, regex::Error)> {
        let extra = extra
            .iter()
            .map(|p| Regex::new(p).map_err(|e| (p.clone(), e)))
            .collect::<Result<_, _>>()?;
        Ok(Self { extra })
    }

    /// Replace credential-shaped substrings
    #[must_use]
    pub fn redact(&self, text: &str) -> Redacted {
        let mut out = text.to_string();
        let mut redacted = false;
        for rule in BUILTIN.iter() {
            if rule.pattern.is_match(&out) {
                out = rule.pattern.replace_all(&out, rule.replacement).into_owned();
                redacted = true;
            }
        }
        for pattern in &self.extra {
            if pattern.is_match(&out) {
                out = pattern.replace_all(&out, REDACTED).into_owned();
                redacted = true;
            }
        }
        Redacted { text: out, redacted }
    }

    /// Redact then truncate to [`MAX_SNIPPET_CHARS`]
    ///
    /// Redaction runs first so truncation can never expose part of a secret
    /// that a pattern would have matched whole.
    #[must_use]
    pub fn snippet(&self, text: &str) -> Redacted {
        let Redacted { text, redacted } = self.redact(text.trim());
        Redacted {
            text: truncate(&text, MAX_SNIPPET_CHARS),
            redacted,
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
