//! Selective write-back of assigned Linear ids into the original document.
//!
//! Only the `linear_id` / `linear_url` lines of matched stories change.
//! Every other byte, including line endings, comments, field order, and
//! unrelated stories, is copied through untouched.

use std::collections::HashMap;

use crate::markdown::{
    block_indent, field_key, frontmatter_close, is_blank, line_ending, metadata_fence,
    story_starts, story_title, yaml_scalar, FENCE, METADATA_FENCE,
};
use crate::types::LinearLink;

const ID_KEY: &str = "linear_id";
const URL_KEY: &str = "linear_url";

/// Return `original` with each story whose title is a key of `updates`
/// pointing at the given Linear id and url.
///
/// An empty `updates` returns the input unchanged. A story without a
/// metadata fence gets a new fence holding just the two lines, right after
/// its title. A title appearing more than once is only updated at its
/// first occurrence.
pub fn apply_writeback(original: &str, updates: &HashMap<String, LinearLink>) -> String {
    if updates.is_empty() {
        return original.to_string();
    }

    let lines: Vec<&str> = original.split_inclusive('\n').collect();
    let content_start = frontmatter_close(&lines).map_or(0, |close| close + 1);
    let starts = story_starts(&lines, content_start);

    let mut pending: HashMap<&str, &LinearLink> =
        updates.iter().map(|(k, v)| (k.as_str(), v)).collect();
    let mut out = String::with_capacity(original.len() + 160 * updates.len());

    let first_story = starts.first().copied().unwrap_or(lines.len());
    push_lines(&mut out, &lines[..first_story]);

    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(lines.len());
        match story_title(lines[start]).and_then(|title| pending.remove(title)) {
            Some(link) => rewrite_story(&mut out, &lines, start, end, link),
            None => push_lines(&mut out, &lines[start..end]),
        }
    }

    for title in pending.keys() {
        tracing::warn!(title, "write-back target not found in document");
    }
    out
}

fn push_lines(out: &mut String, lines: &[&str]) {
    for line in lines {
        out.push_str(line);
    }
}

fn rewrite_story(out: &mut String, lines: &[&str], start: usize, end: usize, link: &LinearLink) {
    let title = lines[start];
    let eol = line_ending(title);
    out.push_str(title);
    if !title.ends_with('\n') {
        out.push_str(eol);
    }

    let Some((open, close)) = metadata_fence(lines, start, end) else {
        insert_fence(out, &lines[start + 1..end], link, eol);
        return;
    };

    push_lines(out, &lines[start + 1..=open]);
    let fence_eol = line_ending(lines[open]);
    let fields = &lines[open + 1..close];
    let indent = block_indent(fields);
    let mut wrote_id = false;
    let mut wrote_url = false;
    for &line in fields {
        match field_key(line, indent) {
            Some(ID_KEY) if !wrote_id => {
                out.push_str(&replace_value(line, ID_KEY, &link.id));
                wrote_id = true;
            }
            Some(URL_KEY) if !wrote_url => {
                out.push_str(&replace_value(line, URL_KEY, &link.url));
                wrote_url = true;
            }
            _ => out.push_str(line),
        }
    }
    if !wrote_id {
        out.push_str(&field_line(indent, ID_KEY, &link.id, fence_eol));
    }
    if !wrote_url {
        out.push_str(&field_line(indent, URL_KEY, &link.url, fence_eol));
    }
    push_lines(out, &lines[close..end]);
}

/// New fence directly after the title, separated by a blank line; the
/// rest of the story follows unchanged.
fn insert_fence(out: &mut String, rest: &[&str], link: &LinearLink, eol: &str) {
    out.push_str(eol);
    out.push_str(METADATA_FENCE);
    out.push_str(eol);
    out.push_str(&field_line("", ID_KEY, &link.id, eol));
    out.push_str(&field_line("", URL_KEY, &link.url, eol));
    out.push_str(FENCE);
    out.push_str(eol);
    if rest.first().is_some_and(|line| !is_blank(line)) {
        out.push_str(eol);
    }
    push_lines(out, rest);
}

/// Rewrite `line`'s value, keeping its indentation and terminator.
fn replace_value(line: &str, key: &str, value: &str) -> String {
    let indent_len = line.len() - line.trim_start().len();
    let eol = if line.ends_with('\n') {
        line_ending(line)
    } else {
        ""
    };
    field_line(&line[..indent_len], key, value, eol)
}

fn field_line(indent: &str, key: &str, value: &str, eol: &str) -> String {
    format!("{indent}{key}: {}{eol}", yaml_scalar(value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
