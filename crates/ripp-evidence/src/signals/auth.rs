//! Authentication idioms

use super::{line_number, Idiom};
use crate::redact::Redactor;
use once_cell::sync::Lazy;
use ripp_core::AuthSignal;

static IDIOMS: Lazy<Vec<Idiom>> = Lazy::new(|| {
    vec![
        Idiom::new(
            "login-decorator",
            r"@(?:login_required|requires_auth|jwt_required|PreAuthorize|Secured|RolesAllowed)\b",
        ),
        Idiom::new("passport", r"\bpassport\.(?:use|authenticate|initialize)\b"),
        Idiom::new(
            "jwt",
            r"(?i)\bjsonwebtoken\b|\bjwt\.(?:sign|verify|decode|encode)\b|\bjsonwebtoken::|\bJwtStrategy\b",
        ),
        Idiom::new("oauth", r"(?i)\boauth2?(?:client|provider|strategy)?\b|\bopenid\b"),
        Idiom::new(
            "session",
            r"(?i)\bexpress-session\b|\breq\.session\b|\bSessionMiddleware\b|\bsession\[",
        ),
        Idiom::new("password-hash", r"(?i)\b(?:bcrypt|argon2|scrypt|pbkdf2)\b"),
        Idiom::new(
            "middleware",
            r"\b(?:auth(?:enticate|orize)?Middleware|requireAuth|isAuthenticated|ensureAuthenticated|authGuard|AuthGuard)\b",
        ),
    ]
});

pub(crate) fn extract(file: &str, text: &str, redactor: &Redactor) -> Vec<AuthSignal> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let idiom = IDIOMS.iter().find(|idiom| idiom.pattern.is_match(line))?;
            let snippet = redactor.snippet(line);
            Some(AuthSignal {
                file: file.to_string(),
                line: line_number(i),
                mechanism: idiom.name.to_string(),
                snippet: snippet.text,
                redacted: snippet.redacted,
            })
        })
        .collect()
}
