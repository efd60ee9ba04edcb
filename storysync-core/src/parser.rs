//! Story document parser.
//!
//! ~~~text
//! ---                      optional frontmatter (project, team)
//! project: "Q1"
//! team: Eng
//! ---
//!
//! Prose here is ignored.
//!
//! ## Add logout            one story per second-level heading
//!
//! ```yaml                  optional metadata fence
//! linear_id:
//! priority: 2
//! labels: [auth, web]
//! ```
//!
//! Body text, kept verbatim up to the next heading.
//! ~~~

use std::collections::HashSet;

use serde_yaml::{Mapping, Value};

use crate::error::DocumentError;
use crate::markdown::{
    block_indent, field_key, frontmatter_close, is_blank, metadata_fence, story_starts,
    story_title, unescape_body_line,
};
use crate::types::{Frontmatter, Story, StoryDocument};

/// Parse `text` into a [`StoryDocument`].
///
/// `document` labels the source (usually its path) in errors and logs.
///
/// Fails only when the document has no story heading or repeats a title;
/// malformed frontmatter, metadata, and numbers are normalised to empty
/// values.
pub fn parse_document(text: &str, document: &str) -> Result<StoryDocument, DocumentError> {
    let lines: Vec<&str> = text.lines().collect();

    let (frontmatter, content_start) = match frontmatter_close(&lines) {
        Some(close) => (parse_frontmatter(&lines[1..close], document), close + 1),
        None => (Frontmatter::default(), 0),
    };

    let starts = story_starts(&lines, content_start);
    if starts.is_empty() {
        return Err(DocumentError::NoStories {
            document: document.to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut stories = Vec::with_capacity(starts.len());
    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(lines.len());
        let story = parse_story(&lines, start, end, &frontmatter, document);
        if !seen.insert(story.title.clone()) {
            return Err(DocumentError::DuplicateTitle {
                document: document.to_string(),
                title: story.title,
            });
        }
        stories.push(story);
    }

    tracing::debug!(document, stories = stories.len(), "parsed document");
    Ok(StoryDocument {
        frontmatter,
        stories,
    })
}

fn parse_frontmatter(lines: &[&str], document: &str) -> Frontmatter {
    let Some(map) = parse_mapping(lines, document, "frontmatter") else {
        return Frontmatter::default();
    };
    Frontmatter {
        project: string_field(&map, "project"),
        team: string_field(&map, "team"),
    }
}

fn parse_story(
    lines: &[&str],
    start: usize,
    end: usize,
    frontmatter: &Frontmatter,
    document: &str,
) -> Story {
    let title = story_title(lines[start]).unwrap_or_default().to_string();

    let (meta, body_start) = match metadata_fence(lines, start, end) {
        Some((open, close)) => (
            parse_mapping(&lines[open + 1..close], document, &title),
            close + 1,
        ),
        None => (None, start + 1),
    };
    let meta = meta.unwrap_or_default();

    Story {
        linear_id: string_field(&meta, "linear_id"),
        linear_url: string_field(&meta, "linear_url"),
        priority: integer_field(&meta, "priority"),
        labels: labels_field(&meta),
        estimate: number_field(&meta, "estimate"),
        assignee: string_field(&meta, "assignee"),
        status: string_field(&meta, "status"),
        body: body_text(&lines[body_start..end]),
        project: frontmatter.project.clone(),
        team: frontmatter.team.clone(),
        title,
    }
}

/// Section lines with leading and trailing blank lines dropped and
/// escaped headings restored.
fn body_text(lines: &[&str]) -> String {
    let Some(first) = lines.iter().position(|line| !is_blank(line)) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !is_blank(line))
        .unwrap_or(first);
    lines[first..=last]
        .iter()
        .map(|line| unescape_body_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_mapping(lines: &[&str], document: &str, context: &str) -> Option<Mapping> {
    let source = lines.join("\n");
    if source.trim().is_empty() {
        return None;
    }
    match serde_yaml::from_str::<Value>(&source) {
        Ok(Value::Mapping(map)) => Some(map),
        Ok(_) => {
            tracing::warn!(document, context, "metadata is not a key/value mapping; ignoring it");
            None
        }
        Err(err) => {
            let map = recover_fields(lines);
            tracing::warn!(
                document,
                context,
                error = %err,
                recovered = map.len(),
                "unparseable metadata; reading fields one at a time"
            );
            (!map.is_empty()).then_some(map)
        }
    }
}

/// Read each top-level field of a block that failed to parse as a whole,
/// together with its indented continuation lines. A field whose own YAML is
/// broken falls back to its raw single-line text.
fn recover_fields(lines: &[&str]) -> Mapping {
    let indent = block_indent(lines);
    let mut map = Mapping::new();
    let mut n = 0;
    while n < lines.len() {
        let Some(key) = field_key(lines[n], indent) else {
            n += 1;
            continue;
        };
        let end = (n + 1..lines.len())
            .find(|&idx| field_key(lines[idx], indent).is_some())
            .unwrap_or(lines.len());
        let value = match serde_yaml::from_str::<Value>(&lines[n..end].join("\n")) {
            Ok(Value::Mapping(mut single)) => single.remove(key),
            _ => raw_value(lines[n]),
        };
        if let Some(value) = value {
            map.insert(Value::String(key.to_string()), value);
        }
        n = end;
    }
    map
}

/// Text after the first `:` of `line`, minus any trailing comment. Broken
/// flow collections and quoted scalars are not guessed at.
fn raw_value(line: &str) -> Option<Value> {
    let (_, raw) = line.split_once(':')?;
    let raw = raw.split(" #").next().unwrap_or_default().trim();
    let guessable = !raw.is_empty() && !raw.starts_with(['[', '{', '"', '\'']);
    guessable.then(|| Value::String(raw.to_string()))
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn string_field(map: &Mapping, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_text)
}

fn integer_field(map: &Mapping, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_field(map: &Mapping, key: &str) -> Option<f64> {
    let number = match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}

fn labels_field(map: &Mapping) -> Vec<String> {
    match map.get("labels") {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) => split_labels(s),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Split a comma-separated label list, trimming each entry. A bracketed
/// form that YAML left as a plain string (`"[a, b]"`) is accepted too.
fn split_labels(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(raw);
    inner
        .split(',')
        .map(|label| label.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
