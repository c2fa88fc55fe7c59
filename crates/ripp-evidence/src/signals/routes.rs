//! Route-registration idioms

use super::{line_number, Idiom};
use crate::redact::Redactor;
use once_cell::sync::Lazy;
use ripp_core::RouteSignal;

// First match per line wins, so decorator forms precede call forms.
static IDIOMS: Lazy<Vec<Idiom>> = Lazy::new(|| {
    vec![
        Idiom::new(
            "fastapi",
            r#"@(?:app|router|api)\.(?P<method>get|post|put|patch|delete)\(\s*['"](?P<path>[^'"]+)['"]"#,
        ),
        Idiom::new(
            "flask",
            r#"@\w+\.route\(\s*['"](?P<path>[^'"]+)['"](?:.*methods\s*=\s*\[\s*['"](?P<method>\w+)['"])?"#,
        ),
        Idiom::new(
            "express",
            r#"\b(?:app|router|server)\.(?P<method>get|post|put|patch|delete|all)\(\s*['"`](?P<path>/[^'"`]*)['"`]"#,
        ),
        Idiom::new(
            "axum",
            r#"\.route\(\s*"(?P<path>/[^"]*)"\s*,\s*(?P<method>get|post|put|patch|delete)\("#,
        ),
        Idiom::new(
            "actix",
            r#"#\[(?P<method>get|post|put|patch|delete)\(\s*"(?P<path>/[^"]*)""#,
        ),
        Idiom::new(
            "spring",
            r#"@(?P<method>Get|Post|Put|Patch|Delete|Request)Mapping\(\s*(?:(?:value|path)\s*=\s*)?"(?P<path>[^"]+)""#,
        ),
    ]
});

pub(crate) fn extract(file: &str, text: &str, redactor: &Redactor) -> Vec<RouteSignal> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let Some((idiom, caps)) = IDIOMS
            .iter()
            .find_map(|idiom| idiom.pattern.captures(line).map(|c| (idiom, c)))
        else {
            continue;
        };
        let method = caps
            .name("method")
            .map(|m| m.as_str().to_ascii_uppercase())
            .filter(|m| m != "REQUEST" && m != "ALL");
        let path = redactor.redact(caps.name("path").map_or("", |m| m.as_str()));
        let snippet = redactor.snippet(line);
        out.push(RouteSignal {
            file: file.to_string(),
            line: line_number(i),
            method,
            path: path.text,
            framework: idiom.name.to_string(),
            snippet: snippet.text,
            redacted: path.redacted || snippet.redacted,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes(text: &str) -> Vec<(String, Option<String>, String)> {
        extract("f", text, &Redactor::default())
            .into_iter()
            .map(|r| (r.framework, r.method, r.path))
            .collect()
    }

    #[test]
    fn express_routes() {
        let found = routes("app.get('/users', list);\nrouter.post(\"/users/:id\", update);");
        assert_eq!(
            found,
            vec![
                ("express".into(), Some("GET".into()), "/users".into()),
                ("express".into(), Some("POST".into()), "/users/:id".into()),
            ]
        );
    }

    #[test]
    fn python_decorators() {
        let found = routes("@app.get(\"/items/{id}\")\n@bp.route('/login', methods=['POST'])");
        assert_eq!(found[0], ("fastapi".into(), Some("GET".into()), "/items/{id}".into()));
        assert_eq!(found[1], ("flask".into(), Some("POST".into()), "/login".into()));
    }

    #[test]
    fn rust_and_java() {
        let found = routes(
            ".route(\"/health\", get(health))\n#[post(\"/orders\")]\n@GetMapping(\"/api/orders\")\n@RequestMapping(value = \"/api\")",
        );
        assert_eq!(found[0], ("axum".into(), Some("GET".into()), "/health".into()));
        assert_eq!(found[1], ("actix".into(), Some("POST".into()), "/orders".into()));
        assert_eq!(found[2], ("spring".into(), Some("GET".into()), "/api/orders".into()));
        assert_eq!(found[3], ("spring".into(), None, "/api".into()));
    }

    #[test]
    fn line_numbers_are_one_based() {
        let found = extract("f", "\n\napp.delete('/x', h)", &Redactor::default());
        assert_eq!(found[0].line, 3);
    }
}
