//! Wiki markup rendering
//!
//! Turns raw article text into an HTML fragment. The input is escaped first,
//! then three link passes run in order:
//!
//! 1. `[[Target]]` / `[[Target|Label]]` cross-references
//! 2. `nostr:` entity tokens
//! 3. bare `http://` / `https://` URLs
//!
//! A cross-reference whose target has no letters (`[[42]]`) stays literal
//! text, since no topic key exists for it.
//!
//! Each pass only looks at text that no earlier pass turned into markup, so a
//! URL inside a generated `href` is never linked twice. Finally the text is
//! split into paragraphs on blank lines; single newlines become `<br>`.
//!
//! Rendering never fails. It must be given raw text exactly once: already
//! escaped input would be escaped again.

use crate::topic::normalize_topic;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static CROSS_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]|\n]+)(?:\|([^\]\n]+))?\]\]").expect("cross-reference pattern")
});

static NOSTR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnostr:\w+").expect("nostr token pattern"));

// Stops at whitespace, angle brackets and quotes; never ends on punctuation.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"']*[^\s<>"'.,;:!?)\]]"#).expect("url pattern")
});

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph pattern"));

/// A `[[...]]` cross-reference found in raw article text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReference {
    /// Normalized topic key the link points at
    pub target: String,
    /// Visible link text (the label, or the raw target when there is none)
    pub label: String,
}

/// Piece of the document while passes run
enum Piece {
    /// Escaped text still open to later passes
    Text(String),
    /// Finished markup
    Markup(String),
}

/// Render raw article text to an HTML fragment
///
/// # Examples
///
/// ```
/// use wiki_relay::render;
///
/// let html = render("See [[Foo Bar|this page]].\n\nBye");
/// assert_eq!(
///     html,
///     "<p>See <a href=\"#\" class=\"wikilink\" data-topic=\"foo-bar\">this page</a>.</p><p>Bye</p>"
/// );
/// ```
pub fn render(raw: &str) -> String {
    render_paragraphs(raw).concat()
}

/// Render raw article text to a list of `<p>` fragments
pub fn render_paragraphs(raw: &str) -> Vec<String> {
    let escaped = escape_html(&raw.replace("\r\n", "\n"));

    let mut pieces = vec![Piece::Text(escaped)];
    pieces = link_pass(pieces, &CROSS_REFERENCE, cross_reference_anchor);
    pieces = link_pass(pieces, &NOSTR_TOKEN, |caps| {
        let token = &caps[0];
        Some(format!(r#"<a href="{token}" target="_blank">{token}</a>"#))
    });
    pieces = link_pass(pieces, &URL, |caps| {
        let url = &caps[0];
        Some(format!(
            r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>"#
        ))
    });

    let body: String = pieces
        .into_iter()
        .map(|piece| match piece {
            Piece::Text(s) | Piece::Markup(s) => s,
        })
        .collect();

    PARAGRAPH_BREAK
        .split(&body)
        .map(|p| p.trim_matches('\n'))
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
        .collect()
}

/// List the cross-references in raw article text, in document order
///
/// References whose target has no letters are skipped, matching [`render`].
///
/// # Examples
///
/// ```
/// use wiki_relay::cross_references;
///
/// let refs = cross_references("[[Alpha]] and [[Beta Gamma|b]]");
/// assert_eq!(refs[0].target, "alpha");
/// assert_eq!(refs[1].target, "beta-gamma");
/// assert_eq!(refs[1].label, "b");
/// ```
pub fn cross_references(raw: &str) -> Vec<CrossReference> {
    CROSS_REFERENCE
        .captures_iter(raw)
        .filter_map(|caps| {
            let target = &caps[1];
            let topic = normalize_topic(target);
            if topic.is_empty() {
                return None;
            }
            let label = caps.get(2).map_or(target, |m| m.as_str());
            Some(CrossReference {
                target: topic,
                label: label.to_string(),
            })
        })
        .collect()
}

/// Escape the characters that would otherwise be read as markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn cross_reference_anchor(caps: &Captures<'_>) -> Option<String> {
    let target = &caps[1];
    // Captured from escaped text; the key comes from what the author wrote
    let topic = normalize_topic(&unescape_html(target));
    if topic.is_empty() {
        return None;
    }
    let label = caps.get(2).map_or(target, |m| m.as_str());
    Some(format!(
        r##"<a href="#" class="wikilink" data-topic="{}">{}</a>"##,
        topic, label
    ))
}

/// Undo [`escape_html`]
fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Replace every match in the remaining text pieces with markup
///
/// Matches for which `anchor` returns `None` stay as text.
fn link_pass<F>(pieces: Vec<Piece>, pattern: &Regex, anchor: F) -> Vec<Piece>
where
    F: Fn(&Captures<'_>) -> Option<String>,
{
    let mut out = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let text = match piece {
            Piece::Text(text) => text,
            markup @ Piece::Markup(_) => {
                out.push(markup);
                continue;
            }
        };

        let mut last = 0;
        for caps in pattern.captures_iter(&text) {
            let (Some(whole), Some(markup)) = (caps.get(0), anchor(&caps)) else {
                continue;
            };
            if whole.start() > last {
                out.push(Piece::Text(text[last..whole.start()].to_string()));
            }
            out.push(Piece::Markup(markup));
            last = whole.end();
        }
        if last < text.len() {
            out.push(Piece::Text(text[last..].to_string()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_before_linking() {
        let html = render("<script>[[A]]");
        assert_eq!(
            html,
            r##"<p>&lt;script&gt;<a href="#" class="wikilink" data-topic="a">A</a></p>"##
        );
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_ampersand_escaped() {
        assert_eq!(render("Tom & Jerry"), "<p>Tom &amp; Jerry</p>");
    }

    #[test]
    fn test_paragraphs_and_line_breaks() {
        assert_eq!(render_paragraphs("a\n\nb"), vec!["<p>a</p>", "<p>b</p>"]);
        assert_eq!(render_paragraphs("a\nb"), vec!["<p>a<br>b</p>"]);
        assert_eq!(
            render_paragraphs("a\n\n\n\nb\r\nc"),
            vec!["<p>a</p>", "<p>b<br>c</p>"]
        );
    }

    #[test]
    fn test_blank_input_has_no_paragraphs() {
        assert!(render_paragraphs("").is_empty());
        assert!(render_paragraphs("\n\n  \n\n").is_empty());
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_cross_reference_with_label() {
        let html = render("[[Foo Bar|see]]");
        assert_eq!(
            html,
            r##"<p><a href="#" class="wikilink" data-topic="foo-bar">see</a></p>"##
        );
    }

    #[test]
    fn test_cross_reference_label_is_escaped() {
        let html = render("[[x|<b>bold</b>]]");
        assert!(html.contains(">&lt;b&gt;bold&lt;/b&gt;</a>"));
    }

    #[test]
    fn test_malformed_cross_references_stay_literal() {
        assert_eq!(render("[[unclosed"), "<p>[[unclosed</p>");
        assert_eq!(render("[[a]b]]"), "<p>[[a]b]]</p>");
        assert_eq!(render("[[]]"), "<p>[[]]</p>");
        assert_eq!(render("[[a\nb]]"), "<p>[[a<br>b]]</p>");
    }

    #[test]
    fn test_nostr_token() {
        let html = render("by nostr:npub1abc23 today");
        assert_eq!(
            html,
            r#"<p>by <a href="nostr:npub1abc23" target="_blank">nostr:npub1abc23</a> today</p>"#
        );
    }

    #[test]
    fn test_url_linked_with_rel() {
        let html = render("visit https://example.com/a?b=1&c=2.");
        assert_eq!(
            html,
            r#"<p>visit <a href="https://example.com/a?b=1&amp;c=2" target="_blank" rel="noopener noreferrer">https://example.com/a?b=1&amp;c=2</a>.</p>"#
        );
    }

    #[test]
    fn test_url_cannot_break_attribute() {
        let html = render(r#"https://evil.example/"onmouseover="x"#);
        assert!(html.contains(r#"href="https://evil.example/""#));
        assert!(!html.contains(r#"href="https://evil.example/"onmouseover"#));
    }

    #[test]
    fn test_url_inside_cross_reference_label_not_relinked() {
        let html = render("[[Home|https://example.com]]");
        assert_eq!(html.matches("<a ").count(), 1);
        assert!(html.contains(r#"data-topic="home""#));
    }

    #[test]
    fn test_generated_hrefs_not_relinked() {
        let html = render("nostr:note1xyz and http://a.example");
        assert_eq!(html.matches("<a ").count(), 2);
        assert_eq!(html.matches("</a>").count(), 2);
    }

    #[test]
    fn test_cross_reference_topic_from_unescaped_target() {
        let text = "[[Q&A]] and [[Tom & Jerry|tj]] or [[a<b>c]]";
        let html = render(text);
        let refs = cross_references(text);

        assert!(html.contains(r#"data-topic="q-a">Q&amp;A</a>"#), "{}", html);
        assert!(html.contains(r#"data-topic="tom-jerry">tj</a>"#), "{}", html);
        assert!(html.contains(r#"data-topic="a-b-c">a&lt;b&gt;c</a>"#), "{}", html);
        for link in &refs {
            assert!(html.contains(&format!(r#"data-topic="{}""#, link.target)));
        }
        assert_eq!(refs[1].target, normalize_topic("Tom & Jerry"));
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let raw = "a &lt; b & <c> &amp;";
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }

    #[test]
    fn test_cross_reference_without_letters_stays_literal() {
        assert_eq!(render("see [[42]] now"), "<p>see [[42]] now</p>");
        assert_eq!(render("[[ 1 | one ]]"), "<p>[[ 1 | one ]]</p>");
        assert!(cross_references("[[42]] [[Real]]")
            .iter()
            .all(|link| link.target == "real"));
        assert_eq!(cross_references("[[42]] [[Real]]").len(), 1);
    }

    #[test]
    fn test_literal_cross_reference_still_links_url() {
        let html = render("[[2024|https://example.com]]");
        assert!(html.starts_with("<p>[[2024|<a href=\"https://example.com\""), "{}", html);
        assert!(html.ends_with("</a>]]</p>"), "{}", html);
    }

    #[test]
    fn test_cross_references() {
        let refs = cross_references("[[Alpha]], [[beta|B]] and [[unclosed");
        assert_eq!(
            refs,
            vec![
                CrossReference {
                    target: "alpha".to_string(),
                    label: "Alpha".to_string()
                },
                CrossReference {
                    target: "beta".to_string(),
                    label: "B".to_string()
                },
            ]
        );
    }
}
