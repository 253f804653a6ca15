use pulldown_cmark::{Event, Parser, TagEnd};

/// Drops a leading `---` YAML frontmatter block, if present.
fn strip_frontmatter(markdown: &str) -> &str {
    let Some(rest) = markdown.strip_prefix("---\n") else {
        return markdown;
    };
    match rest.find("\n---\n") {
        Some(pos) => &rest[pos + "\n---\n".len()..],
        None => match rest.strip_suffix("\n---") {
            Some(_) => "",
            None => markdown,
        },
    }
}

/// Markdown rendered down to plain text: markup removed, paragraph and
/// heading boundaries kept as newlines.
pub fn extract_text(markdown: &str) -> String {
    let mut text = String::new();
    let parser = Parser::new(strip_frontmatter(markdown));

    for event in parser {
        match event {
            Event::Text(t) => {
                text.push_str(&t);
                text.push(' ');
            }
            Event::Code(t) => {
                text.push_str(&t);
                text.push(' ');
            }
            Event::SoftBreak | Event::HardBreak => {
                text.push('\n');
            }
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Heading(_)) => {
                text.push('\n');
            }
            _ => {}
        }
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{extract_text, strip_frontmatter};

    #[test]
    fn frontmatter_is_dropped() {
        let markdown = "---\ntags: [garden]\n---\n# Title\n\nBody text.\n";
        let text = extract_text(markdown);
        assert!(!text.contains("tags"));
        assert!(text.contains("Title"));
        assert!(text.contains("Body text."));
    }

    #[test]
    fn markup_is_flattened() {
        let text = extract_text("Some *emphasis* and `inline code` here.");
        assert!(text.contains("emphasis"));
        assert!(text.contains("inline code"));
        assert!(!text.contains('*'));
        assert!(!text.contains('`'));
    }

    #[test]
    fn document_without_frontmatter_is_untouched() {
        assert_eq!(strip_frontmatter("plain text"), "plain text");
        let dashes_later = "intro\n---\noutro";
        assert_eq!(strip_frontmatter(dashes_later), dashes_later);
    }

    #[test]
    fn paragraph_boundaries_become_newlines() {
        let text = extract_text("first paragraph\n\nsecond paragraph");
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        assert_eq!(lines, vec!["first paragraph", "second paragraph"]);
    }
}
