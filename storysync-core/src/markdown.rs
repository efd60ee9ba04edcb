//! Line-level structure shared by the parser and the write-back editor.
//!
//! Every helper takes lines either with or without their terminator
//! (`str::lines` vs `str::split_inclusive('\n')`), so the parser and the
//! editor agree on where frontmatter, stories, and metadata fences are.

use std::borrow::Cow;

/// Frontmatter open/close marker.
pub const FRONTMATTER_DELIMITER: &str = "---";
/// Story boundary prefix: a second-level heading.
pub const STORY_HEADING: &str = "## ";
/// Opening line of a story's metadata fence.
pub const METADATA_FENCE: &str = "```yaml";
/// Closing line of any fence.
pub const FENCE: &str = "```";

/// `line` without its trailing `\n` / `\r\n`.
pub(crate) fn strip_eol(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => line,
    }
}

/// The terminator `line` carries, defaulting to `\n` for a final line
/// without one.
pub(crate) fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

pub(crate) fn is_blank(line: &str) -> bool {
    strip_eol(line).trim().is_empty()
}

/// Title of a story boundary line, or `None` if `line` is not one.
pub fn story_title(line: &str) -> Option<&str> {
    let title = strip_eol(line).strip_prefix(STORY_HEADING)?.trim();
    (!title.is_empty()).then_some(title)
}

fn is_fence_close(line: &str) -> bool {
    strip_eol(line).trim() == FENCE
}

/// Index of the closing frontmatter delimiter, if the document opens with
/// a complete frontmatter block.
pub(crate) fn frontmatter_close<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    let first = lines.first()?;
    if strip_eol(first.as_ref()).trim_end() != FRONTMATTER_DELIMITER {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| strip_eol(line.as_ref()).trim_end() == FRONTMATTER_DELIMITER)
        .map(|(idx, _)| idx)
}

/// Indices of every story boundary at or after `from`.
pub(crate) fn story_starts<S: AsRef<str>>(lines: &[S], from: usize) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .filter(|(_, line)| story_title(line.as_ref()).is_some())
        .map(|(idx, _)| idx)
        .collect()
}

/// Locate the metadata fence of the story whose title sits at `title_idx`
/// and whose section ends (exclusive) at `end`.
///
/// Blank lines between the title and the fence are allowed. A fence that
/// is not closed before `end` does not count. Returns `(open, close)`.
pub(crate) fn metadata_fence<S: AsRef<str>>(
    lines: &[S],
    title_idx: usize,
    end: usize,
) -> Option<(usize, usize)> {
    let open = (title_idx + 1..end).find(|&idx| !is_blank(lines[idx].as_ref()))?;
    if !is_metadata_open(lines[open].as_ref()) {
        return None;
    }
    let close = (open + 1..end).find(|&idx| is_fence_close(lines[idx].as_ref()))?;
    Some((open, close))
}

/// Leading whitespace of `line`.
pub(crate) fn indent_of(line: &str) -> &str {
    let line = strip_eol(line);
    &line[..line.len() - line.trim_start().len()]
}

/// Indentation of a YAML block's top-level keys: that of its first line
/// that is neither blank nor a comment.
pub(crate) fn block_indent<S: AsRef<str>>(lines: &[S]) -> &str {
    lines
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|line| !is_blank(line) && !line.trim_start().starts_with('#'))
        .map_or("", indent_of)
}

/// Key of a top-level `key: value` line in a block indented by `indent`.
/// Deeper (nested) lines are not fields.
pub(crate) fn field_key<'a>(line: &'a str, indent: &str) -> Option<&'a str> {
    let rest = strip_eol(line).strip_prefix(indent)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (key, _) = rest.split_once(':')?;
    let key = key.trim_end();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(key)
}

/// A body line with one more leading backslash if it would otherwise read
/// as a story boundary (`## X` becomes `\## X`).
pub(crate) fn escape_body_line(line: &str) -> Cow<'_, str> {
    if line.trim_start_matches('\\').starts_with(STORY_HEADING) {
        Cow::Owned(format!("\\{line}"))
    } else {
        Cow::Borrowed(line)
    }
}

/// Inverse of [`escape_body_line`].
pub(crate) fn unescape_body_line(line: &str) -> &str {
    match line.strip_prefix('\\') {
        Some(rest) if rest.trim_start_matches('\\').starts_with(STORY_HEADING) => rest,
        _ => line,
    }
}

/// Whether `line` opens a metadata fence.
pub(crate) fn is_metadata_open(line: &str) -> bool {
    matches!(strip_eol(line).trim_end(), "```yaml" | "```yml")
}

/// Render `value` as a YAML scalar, quoting only when a plain scalar would
/// be misread (as a number, bool, null, flow collection, comment, ...).
pub fn yaml_scalar(value: &str) -> String {
    if needs_quotes(value) {
        // JSON string escapes are a subset of YAML double-quoted escapes.
        serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
    } else {
        value.to_string()
    }
}

fn needs_quotes(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return true;
    };
    if value.trim() != value || value.chars().any(char::is_control) {
        return true;
    }
    if matches!(
        first,
        '-' | '?' | ':' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@' | '`' | '.'
    ) {
        return true;
    }
    if value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return true;
    }
    if value.contains([',', '[', ']', '{', '}']) {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "~" | "null" | "true" | "false" | "yes" | "no" | "on" | "off" | "y" | "n"
    ) {
        return true;
    }
    lower.starts_with("0x") || lower.starts_with("0o") || value.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_title_requires_level_two_heading_and_text() {
        assert_eq!(story_title("## Add logout\n"), Some("Add logout"));
        assert_eq!(story_title("##   Padded  \r\n"), Some("Padded"));
        assert_eq!(story_title("### Nested"), None);
        assert_eq!(story_title("# Top"), None);
        assert_eq!(story_title("##NoSpace"), None);
        assert_eq!(story_title("##    "), None);
    }

    #[test]
    fn frontmatter_requires_both_delimiters() {
        let lines = ["---", "team: Eng", "---", "## A"];
        assert_eq!(frontmatter_close(&lines), Some(2));
        let unclosed = ["---", "team: Eng", "## A"];
        assert_eq!(frontmatter_close(&unclosed), None);
        let none = ["## A", "---"];
        assert_eq!(frontmatter_close(&none), None);
    }

    #[test]
    fn metadata_fence_tolerates_blank_lines() {
        let lines = ["## A", "", "  ", "```yaml", "priority: 1", "```", "body"];
        assert_eq!(metadata_fence(&lines, 0, lines.len()), Some((3, 5)));
    }

    #[test]
    fn metadata_fence_must_come_first_and_be_closed() {
        let prose_first = ["## A", "text", "```yaml", "a: 1", "```"];
        assert_eq!(metadata_fence(&prose_first, 0, prose_first.len()), None);
        let unclosed = ["## A", "```yaml", "a: 1", "## B"];
        assert_eq!(metadata_fence(&unclosed, 0, 3), None);
        let other_lang = ["## A", "```rust", "fn x() {}", "```"];
        assert_eq!(metadata_fence(&other_lang, 0, other_lang.len()), None);
    }

    #[test]
    fn field_key_reads_simple_keys_only() {
        assert_eq!(field_key("linear_id: abc\n", ""), Some("linear_id"));
        assert_eq!(field_key("  linear_url:\n", "  "), Some("linear_url"));
        assert_eq!(field_key("# linear_id: x", ""), None);
        assert_eq!(field_key("just text", ""), None);
    }

    #[test]
    fn nested_keys_are_not_fields() {
        assert_eq!(field_key("  linear_id: x", ""), None);
        assert_eq!(field_key("    linear_id: x", "  "), None);
        assert_eq!(field_key("linear_id: x", "  "), None);
    }

    #[test]
    fn block_indent_skips_blanks_and_comments() {
        assert_eq!(block_indent(&["", "# note", "  a: 1", "    b: 2"]), "  ");
        assert_eq!(block_indent(&["a: 1", "notes:", "  linear_id: x"]), "");
        assert_eq!(block_indent::<&str>(&[]), "");
    }

    #[test]
    fn heading_like_body_lines_are_escaped_reversibly() {
        assert_eq!(escape_body_line("## Acceptance criteria"), "\\## Acceptance criteria");
        assert_eq!(escape_body_line("\\## already"), "\\\\## already");
        assert_eq!(escape_body_line("### deeper"), "### deeper");
        assert_eq!(escape_body_line(" ## indented"), " ## indented");
        for line in ["## A", "\\## B", "\\\\## C", "plain", "\\not heading"] {
            assert_eq!(unescape_body_line(&escape_body_line(line)), line);
        }
        assert_eq!(story_title(&escape_body_line("## A")), None);
    }

    #[test]
    fn yaml_scalar_quotes_only_when_needed() {
        assert_eq!(yaml_scalar("Eng"), "Eng");
        assert_eq!(yaml_scalar("In Progress"), "In Progress");
        assert_eq!(
            yaml_scalar("https://linear.app/acme/issue/ENG-1"),
            "https://linear.app/acme/issue/ENG-1"
        );
        assert_eq!(yaml_scalar("42"), "\"42\"");
        assert_eq!(yaml_scalar("true"), "\"true\"");
        assert_eq!(yaml_scalar("a, b"), "\"a, b\"");
        assert_eq!(yaml_scalar("key: value"), "\"key: value\"");
        assert_eq!(yaml_scalar(""), "\"\"");
        assert_eq!(yaml_scalar("say \"hi\""), "say \"hi\"");
        assert_eq!(yaml_scalar("\"quoted\""), "\"\\\"quoted\\\"\"");
    }

    #[test]
    fn quoted_scalars_read_back_as_strings() {
        for value in ["42", "true", "a, b", "key: value", "null", "- dash", "#tag"] {
            let yaml = format!("v: {}", yaml_scalar(value));
            let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).expect("parse");
            assert_eq!(parsed["v"].as_str(), Some(value), "value {value:?}");
        }
    }
}
