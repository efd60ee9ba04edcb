//! Story document serializer: the inverse of [`crate::parser`].

use crate::markdown::{
    escape_body_line, is_blank, is_metadata_open, yaml_scalar, FENCE, FRONTMATTER_DELIMITER,
    METADATA_FENCE, STORY_HEADING,
};
use crate::types::{Frontmatter, Story};

/// Render stories (and optional frontmatter) as document text.
///
/// The output reads back through [`crate::parse_document`] to the same
/// frontmatter and story fields. Stories without any metadata get no
/// metadata fence unless their body opens with a YAML fence of its own.
/// Body lines that look like story headings are backslash-escaped. The
/// result always ends with a newline.
pub fn serialize_document(stories: &[Story], frontmatter: Option<&Frontmatter>) -> String {
    let mut out = String::new();

    if let Some(fm) = frontmatter.filter(|fm| !fm.is_empty()) {
        out.push_str(FRONTMATTER_DELIMITER);
        out.push('\n');
        push_field(&mut out, "project", fm.project.as_deref());
        push_field(&mut out, "team", fm.team.as_deref());
        out.push_str(FRONTMATTER_DELIMITER);
        out.push('\n');
    }

    for story in stories {
        if !out.is_empty() {
            out.push('\n');
        }
        push_story(&mut out, story);
    }

    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn push_story(out: &mut String, story: &Story) {
    out.push_str(STORY_HEADING);
    out.push_str(story.title.trim());
    out.push('\n');

    let body = story.body.trim_end_matches(['\n', '\r']);
    let body_opens_fence = body
        .lines()
        .find(|line| !is_blank(line))
        .is_some_and(is_metadata_open);

    if story.has_metadata() || body_opens_fence {
        out.push('\n');
        out.push_str(METADATA_FENCE);
        out.push('\n');
        push_field(out, "linear_id", story.linear_id.as_deref());
        push_field(out, "linear_url", story.linear_url.as_deref());
        if let Some(priority) = story.priority {
            out.push_str(&format!("priority: {priority}\n"));
        }
        if !story.labels.is_empty() {
            let labels: Vec<String> = story.labels.iter().map(|l| yaml_scalar(l)).collect();
            out.push_str(&format!("labels: [{}]\n", labels.join(", ")));
        }
        if let Some(estimate) = story.estimate {
            out.push_str(&format!("estimate: {}\n", format_number(estimate)));
        }
        push_field(out, "assignee", story.assignee.as_deref());
        push_field(out, "status", story.status.as_deref());
        out.push_str(FENCE);
        out.push('\n');
    }

    if !body.trim().is_empty() {
        out.push('\n');
        let lines: Vec<_> = body.split('\n').map(escape_body_line).collect();
        out.push_str(&lines.join("\n"));
        out.push('\n');
    }
}

fn push_field(out: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&yaml_scalar(value));
        out.push('\n');
    }
}

/// `3.0` → `3`, `1.5` → `1.5`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(title: &str) -> Story {
        Story::new(title)
    }

    #[test]
    fn bare_story_has_no_metadata_fence() {
        let mut s = story("Plain");
        s.body = "Some text".to_string();
        let text = serialize_document(&[s], None);
        assert_eq!(text, "## Plain\n\nSome text\n");
        assert!(!text.contains("```"));
    }

    #[test]
    fn heading_lines_in_body_stay_inside_the_story() {
        let mut s = story("Add logout");
        s.body = "Intro\n\n## Acceptance criteria\n- works".to_string();
        let text = serialize_document(&[s.clone()], None);
        assert!(text.contains("\n\\## Acceptance criteria\n"), "got: {text}");
        let doc = crate::parse_document(&text, "esc.md").expect("parse");
        assert_eq!(doc.stories.len(), 1);
        assert_eq!(doc.stories[0].body, s.body);
    }

    #[test]
    fn body_opening_with_yaml_fence_is_not_read_as_metadata() {
        let mut s = story("Config");
        s.body = "```yaml\npriority: 1\n```\nexplained".to_string();
        let text = serialize_document(&[s.clone()], None);
        let parsed = &crate::parse_document(&text, "y.md").expect("parse").stories[0];
        assert_eq!(parsed.priority, None);
        assert_eq!(parsed.body, s.body);
    }

    #[test]
    fn frontmatter_only_when_present() {
        let without = serialize_document(&[story("A")], Some(&Frontmatter::default()));
        assert!(!without.starts_with("---"));

        let fm = Frontmatter {
            project: Some("Q1".to_string()),
            team: None,
        };
        let with = serialize_document(&[story("A")], Some(&fm));
        assert!(with.starts_with("---\nproject: Q1\n---\n"));
        assert!(!with.contains("team:"));
    }

    #[test]
    fn metadata_fields_are_emitted_in_fixed_order() {
        let s = Story {
            title: "Full".to_string(),
            linear_id: Some("id-1".to_string()),
            linear_url: Some("https://linear.app/acme/issue/ENG-1".to_string()),
            priority: Some(1),
            labels: vec!["bug".to_string(), "ui, web".to_string()],
            estimate: Some(2.0),
            assignee: Some("ada@example.com".to_string()),
            status: Some("Todo".to_string()),
            body: "Body".to_string(),
            project: None,
            team: None,
        };
        let text = serialize_document(&[s], None);
        let expected = "## Full\n\n```yaml\n\
linear_id: id-1\n\
linear_url: https://linear.app/acme/issue/ENG-1\n\
priority: 1\n\
labels: [bug, \"ui, web\"]\n\
estimate: 2\n\
assignee: ada@example.com\n\
status: Todo\n\
```\n\nBody\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn stories_are_separated_by_blank_lines() {
        let mut a = story("A");
        a.body = "alpha\n\n".to_string();
        let b = story("B");
        let text = serialize_document(&[a, b], None);
        assert_eq!(text, "## A\n\nalpha\n\n## B\n");
    }

    #[test]
    fn empty_input_is_a_single_newline() {
        assert_eq!(serialize_document(&[], None), "\n");
    }

    #[test]
    fn fractional_estimate_is_kept() {
        let mut s = story("E");
        s.estimate = Some(0.5);
        assert!(serialize_document(&[s], None).contains("estimate: 0.5\n"));
    }
}
