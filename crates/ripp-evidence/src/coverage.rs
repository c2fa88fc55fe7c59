//! Version-controlled file set
//!
//! Coverage is reported against `git ls-files`. Outside a repository, or when
//! git is unavailable, the caller falls back to every walked file.

use std::collections::BTreeSet;
use std::path::Path;
use tokio::process::Command;

/// Tracked paths relative to `root`, or `None` when git cannot tell
pub async fn tracked_files(root: &Path) -> Option<BTreeSet<String>> {
    let output = match Command::new("git")
        .args(["ls-files", "-z"])
        .current_dir(root)
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(error = %e, "git unavailable, coverage uses walked files");
            return None;
        }
    };
    if !output.status.success() {
        tracing::debug!(root = %root.display(), "not a git work tree, coverage uses walked files");
        return None;
    }

    let tracked: BTreeSet<String> = output
        .stdout
        .split(|b| *b == 0)
        .filter(|p| !p.is_empty())
        .map(|p| String::from_utf8_lossy(p).into_owned())
        .collect();
    (!tracked.is_empty()).then_some(tracked)
}

/// Percentage of `denominator` that was indexed, two decimals
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn percent(indexed: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let raw = indexed as f64 / denominator as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
