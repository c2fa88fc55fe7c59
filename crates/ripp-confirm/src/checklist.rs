//! Checklist artifact
//!
//! A Markdown file a human edits out of band:
//!
//! ~~~text
//! # Intent checklist
//! Candidate set: `<hash>`
//!
//! ## 1. purpose
//! Confidence: 0.85
//! - evidence `src/app.js:4`
//! - [ ] accept
//! - [ ] reject
//!
//! ```yaml
//! problem: ...
//! ```
//! ~~~
//!
//! Parsing is strict per block. A block with exactly one ticked box records
//! that decision, a block with none is skipped, and anything else is an error
//! attached to that block. All block errors are collected before failing.

use crate::error::{BlockError, ChecklistError};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ripp_core::{CandidateSet, ContentHash, SectionName, Verdict};
use ripp_schema::SchemaValidator;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Write as _;

const HASH_PREFIX: &str = "Candidate set:";

/// Decision parsed from one block
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistEntry {
    /// 0-based candidate index
    pub index: usize,
    /// Ticked verdict; `None` when the block is undecided
    pub verdict: Option<Verdict>,
    /// Content to record; present only when accepted
    pub content: Option<Value>,
    /// Whether the YAML differs from the candidate payload
    pub edited: bool,
}

/// Render the checklist for `set`
#[must_use]
pub fn render(set: &CandidateSet, hash: &ContentHash) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Intent checklist\n");
    let _ = writeln!(out, "{HASH_PREFIX} `{hash}`\n");
    let _ = writeln!(
        out,
        "Tick exactly one box per block. Edit the YAML to change what is confirmed.\n\
         Blocks left unticked are skipped.\n"
    );
    for (i, candidate) in set.candidates.iter().enumerate() {
        let _ = writeln!(out, "## {}. {}\n", i + 1, candidate.section);
        let _ = writeln!(out, "Confidence: {}\n", candidate.confidence);
        for evidence in &candidate.evidence {
            let _ = writeln!(out, "- evidence `{evidence}`");
        }
        let _ = writeln!(out, "- [ ] accept\n- [ ] reject\n");
        let yaml = serde_yaml::to_string(&candidate.content).unwrap_or_default();
        let _ = writeln!(out, "```yaml\n{}\n```\n", yaml.trim_end());
    }
    out
}

/// Candidate set hash recorded in a checklist header
#[must_use]
pub fn recorded_hash(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        line.trim()
            .strip_prefix(HASH_PREFIX)
            .map(|rest| rest.trim().trim_matches('`').to_string())
    })
}

/// Normalise CRLF and lone CR line endings to LF
#[must_use]
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

struct LineIndex(Vec<usize>);

impl LineIndex {
    fn new(text: &str) -> Self {
        Self(
            std::iter::once(0)
                .chain(text.match_indices('\n').map(|(i, _)| i + 1))
                .collect(),
        )
    }

    /// 1-based line of a byte offset
    fn line(&self, offset: usize) -> usize {
        self.0.partition_point(|start| *start <= offset)
    }
}

#[derive(Default)]
struct Block {
    heading: String,
    line: usize,
    accept: Option<bool>,
    reject: Option<bool>,
    yaml: Vec<(String, usize)>,
    errors: Vec<(usize, String)>,
}

struct Item {
    marker: Option<bool>,
    text: String,
    line: usize,
}

struct Heading {
    level: HeadingLevel,
    text: String,
    line: usize,
}

struct CodeBlock {
    lang: String,
    text: String,
    line: usize,
}

/// Parse an edited checklist against the set it was generated from
///
/// # Errors
/// Returns every block error; no entry is returned if any block fails
pub fn parse(
    text: &str,
    set: &CandidateSet,
    validator: &SchemaValidator,
) -> Result<Vec<ChecklistEntry>, ChecklistError> {
    let text = normalize_newlines(text);
    let lines = LineIndex::new(&text);

    let mut blocks: Vec<Block> = Vec::new();
    let mut stray: Vec<BlockError> = Vec::new();
    let mut heading: Option<Heading> = None;
    let mut items: Vec<Item> = Vec::new();
    let mut code: Option<CodeBlock> = None;

    for (event, range) in Parser::new_ext(&text, Options::ENABLE_TASKLISTS).into_offset_iter() {
        let line = lines.line(range.start);
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some(Heading {
                    level,
                    text: String::new(),
                    line,
                });
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(h) = heading.take() {
                    if h.level == HeadingLevel::H2 {
                        blocks.push(Block {
                            heading: h.text.trim().to_string(),
                            line: h.line,
                            ..Block::default()
                        });
                    }
                }
            }
            Event::Start(Tag::Item) => items.push(Item {
                marker: None,
                text: String::new(),
                line,
            }),
            Event::TaskListMarker(checked) => {
                if let Some(item) = items.last_mut() {
                    item.marker = Some(checked);
                }
            }
            Event::End(TagEnd::Item) => {
                if let Some(item) = items.pop() {
                    checkbox(item, blocks.last_mut(), &mut stray);
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.trim().to_ascii_lowercase(),
                    CodeBlockKind::Indented => String::new(),
                };
                code = Some(CodeBlock {
                    lang,
                    text: String::new(),
                    line,
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let (Some(c), Some(block)) = (code.take(), blocks.last_mut()) {
                    if matches!(c.lang.as_str(), "yaml" | "yml" | "") {
                        block.yaml.push((c.text, c.line));
                    } else {
                        block
                            .errors
                            .push((c.line, format!("unexpected `{}` code block", c.lang)));
                    }
                }
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some(c) = code.as_mut() {
                    c.text.push_str(&t);
                } else if let Some(h) = heading.as_mut() {
                    h.text.push_str(&t);
                } else if let Some(item) = items.last_mut() {
                    item.text.push_str(&t);
                }
            }
            _ => {}
        }
    }

    let mut errors = stray;
    let mut entries = Vec::new();
    let mut seen = BTreeSet::new();
    for block in blocks {
        let (number, result) = resolve(block, set, validator, &mut seen);
        match result {
            Ok(entry) => entries.push(entry),
            Err(block_errors) => errors.extend(block_errors.into_iter().map(|(line, message)| {
                BlockError {
                    block: number,
                    line,
                    message,
                }
            })),
        }
    }

    if errors.is_empty() {
        entries.sort_by_key(|e| e.index);
        Ok(entries)
    } else {
        errors.sort_by_key(|e| e.line);
        Err(ChecklistError { errors })
    }
}

fn checkbox(item: Item, block: Option<&mut Block>, stray: &mut Vec<BlockError>) {
    let Some(checked) = item.marker else {
        return;
    };
    let Some(block) = block else {
        stray.push(BlockError {
            block: None,
            line: item.line,
            message: "checkbox outside any candidate block".into(),
        });
        return;
    };
    let label = item.text.trim().to_ascii_lowercase();
    let slot = match label.as_str() {
        "accept" => &mut block.accept,
        "reject" => &mut block.reject,
        _ => {
            block
                .errors
                .push((item.line, format!("unrecognised checkbox `{}`", item.text.trim())));
            return;
        }
    };
    if slot.is_some() {
        block
            .errors
            .push((item.line, format!("duplicate `{label}` checkbox")));
    } else {
        *slot = Some(checked);
    }
}

fn parse_heading(heading: &str) -> Option<(usize, &str)> {
    let (number, section) = heading.split_once('.')?;
    let number = number.trim().parse().ok()?;
    let section = section.trim();
    (!section.is_empty() && !section.contains(char::is_whitespace)).then_some((number, section))
}

type BlockResult = Result<ChecklistEntry, Vec<(usize, String)>>;

fn resolve(
    mut block: Block,
    set: &CandidateSet,
    validator: &SchemaValidator,
    seen: &mut BTreeSet<usize>,
) -> (Option<usize>, BlockResult) {
    let Some((number, section_text)) = parse_heading(&block.heading) else {
        block.errors.push((
            block.line,
            format!("malformed heading `{}`; expected `## <n>. <section>`", block.heading),
        ));
        return (None, Err(block.errors));
    };

    let mut errors = std::mem::take(&mut block.errors);
    let candidate = number.checked_sub(1).and_then(|i| set.candidates.get(i));
    if candidate.is_none() {
        errors.push((block.line, format!("unknown block number {number}")));
    }
    if !seen.insert(number) {
        errors.push((block.line, format!("duplicate block number {number}")));
    }
    match (section_text.parse::<SectionName>(), candidate) {
        (Err(_), _) => errors.push((block.line, format!("unknown section `{section_text}`"))),
        (Ok(section), Some(c)) if section != c.section => errors.push((
            block.line,
            format!("section `{section}` does not match candidate {number} (`{}`)", c.section),
        )),
        _ => {}
    }

    let verdict = match (block.accept, block.reject) {
        (None, None) => {
            errors.push((block.line, "missing accept/reject checkboxes".into()));
            None
        }
        (Some(true), Some(true)) => {
            errors.push((block.line, "both accept and reject are ticked".into()));
            None
        }
        (Some(true), _) => Some(Verdict::Accepted),
        (_, Some(true)) => Some(Verdict::Rejected),
        _ => None,
    };

    if block.yaml.len() > 1 {
        errors.push((block.yaml[1].1, "multiple YAML content blocks".into()));
    }
    let yaml = match block.yaml.first() {
        Some((text, line)) => match serde_yaml::from_str::<Value>(text) {
            Ok(value) => Some((value, *line)),
            Err(e) => {
                errors.push((*line, format!("YAML content does not parse: {e}")));
                None
            }
        },
        None => None,
    };

    let Some(candidate) = candidate else {
        return (Some(number), Err(errors));
    };
    let index = number - 1;

    let (content, edited) = match (verdict, yaml) {
        (Some(Verdict::Accepted), Some((Value::Null, line))) => {
            errors.push((line, "accepted block has empty content".into()));
            (None, false)
        }
        (Some(Verdict::Accepted), Some((value, line))) => {
            let findings = validator.validate_section(candidate.section, &value);
            if !findings.is_empty() {
                let detail = findings
                    .iter()
                    .map(|f| format!("{} {}", f.path, f.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                errors.push((
                    line,
                    format!("content does not match the `{}` schema: {detail}", candidate.section),
                ));
            }
            let edited = value != candidate.content;
            (Some(value), edited)
        }
        (Some(Verdict::Accepted), None) => (Some(candidate.content.clone()), false),
        _ => (None, false),
    };

    if errors.is_empty() {
        (
            Some(number),
            Ok(ChecklistEntry {
                index,
                verdict,
                content,
                edited,
            }),
        )
    } else {
        (Some(number), Err(errors))
    }
}
