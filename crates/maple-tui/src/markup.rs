//! Plain-text rendering of bot answers
//!
//! Answers arrive as HTML fragments. Block elements become line breaks and
//! list items become bullets; `script` and `style` content is skipped. The
//! stored message text is never changed.

use scraper::{ElementRef, Html, Node};

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "table", "tr", "blockquote",
    "pre",
];

const SKIPPED_TAGS: &[&str] = &["script", "style", "template", "head", "noscript"];

pub fn markup_to_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let mut out = String::with_capacity(markup.len());
    render_children(fragment.root_element(), &mut out);
    tidy_lines(&out)
}

fn render_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_text(out, text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    render_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_TAGS.contains(&name) {
        return;
    }

    let block = BLOCK_TAGS.contains(&name);
    match name {
        "br" => {
            out.push('\n');
            return;
        }
        "li" => out.push_str("\n• "),
        _ if block => out.push('\n'),
        _ => {}
    }

    render_children(element, out);

    match name {
        "li" => out.push('\n'),
        "td" | "th" => out.push(' '),
        _ if block => out.push('\n'),
        _ => {}
    }
}

/// Append text with HTML whitespace collapsing
fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

/// Trim each line and drop blank ones
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
