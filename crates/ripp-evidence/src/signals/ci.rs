//! Continuous-integration definitions

use crate::redact::Redactor;
use ripp_core::CiSignal;
use serde_yaml::Value;

const GITLAB_RESERVED: &[&str] = &[
    "stages",
    "variables",
    "include",
    "default",
    "workflow",
    "image",
    "services",
    "before_script",
    "after_script",
    "cache",
];

/// Whether `path` (root-relative, `/`-separated) is a CI definition
pub(crate) fn is_ci(path: &str) -> bool {
    let is_yaml = path.ends_with(".yml") || path.ends_with(".yaml");
    (path.starts_with(".github/workflows/") && is_yaml)
        || path == ".gitlab-ci.yml"
        || path.starts_with(".circleci/")
        || path == "azure-pipelines.yml"
        || path == "Jenkinsfile"
}

fn keys(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::Mapping(map)) => map
            .keys()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn extract(file: &str, text: &str, redactor: &Redactor) -> Option<CiSignal> {
    let doc: Value = serde_yaml::from_str(text).ok()?;
    let (mut triggers, mut jobs) = if file.starts_with(".github/") {
        (keys(doc.get("on")), keys(doc.get("jobs")))
    } else if file == ".gitlab-ci.yml" {
        let jobs = keys(Some(&doc))
            .into_iter()
            .filter(|k| !k.starts_with('.') && !GITLAB_RESERVED.contains(&k.as_str()))
            .collect();
        (Vec::new(), jobs)
    } else {
        (Vec::new(), keys(doc.get("jobs")))
    };

    let mut redacted = false;
    for name in triggers.iter_mut().chain(jobs.iter_mut()) {
        let r = redactor.redact(name);
        redacted |= r.redacted;
        *name = r.text;
    }
    triggers.sort();
    jobs.sort();

    Some(CiSignal {
        file: file.to_string(),
        triggers,
        jobs,
        redacted,
    })
}
