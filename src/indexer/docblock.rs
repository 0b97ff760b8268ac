//! PHPDoc comment parsing.
//!
//! Splits a `/** ... */` comment into a summary (first paragraph), a long
//! description (the remaining text before the first tag) and `@tag` lines.
//! A tag's content continues over following lines until the next tag.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{DocBlock, Tag};

static TAG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@([A-Za-z][\w:\\-]*)(?:\s+(.*))?$").expect("tag regex is valid")
});

/// Returns true for `/** */` style comments.
pub fn is_docblock(comment: &str) -> bool {
    let trimmed = comment.trim_start();
    trimmed.starts_with("/**") && !trimmed.starts_with("/**/")
}

/// Parses a raw docblock comment.
pub fn parse_docblock(comment: &str) -> DocBlock {
    let lines = clean_lines(comment);

    let mut text_lines: Vec<&str> = Vec::new();
    let mut tags: Vec<Tag> = Vec::new();

    for line in &lines {
        if let Some(caps) = TAG_LINE.captures(line) {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let content = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            tags.push(Tag::new(name, content));
        } else if let Some(last) = tags.last_mut() {
            let line = line.trim();
            if !line.is_empty() {
                if !last.content.is_empty() {
                    last.content.push(' ');
                }
                last.content.push_str(line);
            }
        } else {
            text_lines.push(line);
        }
    }

    let (summary, description) = split_summary(&text_lines);
    DocBlock {
        summary,
        description,
        tags,
    }
}

/// Strips comment delimiters and leading asterisks.
fn clean_lines(comment: &str) -> Vec<String> {
    let body = comment.trim();
    let body = body.strip_prefix("/**").unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);

    body.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()
        })
        .collect()
}

fn split_summary(lines: &[&str]) -> (String, String) {
    let mut iter = lines.iter().skip_while(|l| l.trim().is_empty());

    let mut summary: Vec<&str> = Vec::new();
    for line in iter.by_ref() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        summary.push(trimmed);
    }

    let rest: Vec<&str> = iter.copied().collect();
    let description = rest.join("\n").trim().to_string();

    (summary.join(" "), description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary_description_and_tags() {
        let doc = parse_docblock(
            r#"/**
             * Retrieves post data given a post ID.
             *
             * See sanitize_post() for optional $filter values.
             * Second line of the description.
             *
             * @since 1.5.1
             * @internal
             *
             * @param int|WP_Post $post Post ID or post object.
             * @return WP_Post|null
             */"#,
        );

        assert_eq!(doc.summary, "Retrieves post data given a post ID.");
        assert_eq!(
            doc.description,
            "See sanitize_post() for optional $filter values.\nSecond line of the description."
        );
        assert_eq!(doc.tags.len(), 4);
        assert_eq!(doc.since(), Some("1.5.1"));
        assert!(doc.is_internal());
        assert_eq!(doc.tags[2].name, "param");
        assert_eq!(doc.tags[2].content, "int|WP_Post $post Post ID or post object.");
    }

    #[test]
    fn test_multiline_summary() {
        let doc = parse_docblock("/**\n * First line\n * continues here.\n */");
        assert_eq!(doc.summary, "First line continues here.");
        assert!(doc.description.is_empty());
    }

    #[test]
    fn test_single_line_docblock() {
        let doc = parse_docblock("/** @since 2.0 */");
        assert!(doc.summary.is_empty());
        assert_eq!(doc.since(), Some("2.0"));
    }

    #[test]
    fn test_tag_continuation_lines() {
        let doc = parse_docblock(
            "/**\n * Summary.\n *\n * @param array $args {\n *     Optional arguments.\n * }\n */",
        );
        assert_eq!(doc.tags.len(), 1);
        assert_eq!(doc.tags[0].content, "array $args { Optional arguments. }");
    }

    #[test]
    fn test_namespaced_tag_names() {
        let doc = parse_docblock("/**\n * @phpstan-return int\n * @ORM\\Column\n */");
        assert_eq!(doc.tags[0].name, "phpstan-return");
        assert_eq!(doc.tags[1].name, "ORM\\Column");
    }

    #[test]
    fn test_is_docblock() {
        assert!(is_docblock("/** Summary */"));
        assert!(is_docblock("  /**\n * x\n */"));
        assert!(!is_docblock("/* plain */"));
        assert!(!is_docblock("// line"));
        assert!(!is_docblock("/**/"));
    }

    #[test]
    fn test_empty_docblock() {
        assert!(parse_docblock("/** */").is_empty());
    }
}
