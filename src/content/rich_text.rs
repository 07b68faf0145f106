//! Structured rich text: the ordered node sequence stored by the CMS
//!
//! Two conversions are provided: [`as_text`] for word counting and
//! [`as_html`] for rendering a post body.

use serde::{Deserialize, Serialize};

use crate::helpers::html_escape;

/// One block of structured text (paragraph, heading, list item, image...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: String,
    /// Absent on images and embeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Embed>,
}

/// Inline formatting over `[start, end)` of a node's text.
///
/// Offsets are counted in chars; the CMS counts UTF-16 units, so the two
/// only disagree on text outside the Basic Multilingual Plane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Embed {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub embed_url: Option<String>,
    pub html: Option<String>,
}

impl RichTextNode {
    /// Plain text node of the given type
    pub fn new(kind: &str, text: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::new("paragraph", text)
    }
}

/// Concatenate the text of every node that carries text, separated by a
/// single space.
pub fn as_text(nodes: &[RichTextNode]) -> String {
    let mut result = String::new();
    for text in nodes.iter().filter_map(|n| n.text.as_deref()) {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(text);
    }
    result
}

/// Render a node sequence as HTML. Consecutive list items are grouped into
/// a single `<ul>` or `<ol>`.
pub fn as_html(nodes: &[RichTextNode]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for node in nodes {
        let list = match node.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        html.push_str(&render_node(node));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

fn render_node(node: &RichTextNode) -> String {
    let inner = || render_spans(node.text.as_deref().unwrap_or(""), &node.spans);

    match node.kind.as_str() {
        "paragraph" => format!("<p>{}</p>", inner()),
        "preformatted" => format!("<pre>{}</pre>", inner()),
        "list-item" | "o-list-item" => format!("<li>{}</li>", inner()),
        kind if kind.starts_with("heading") => match &kind["heading".len()..] {
            level @ ("1" | "2" | "3" | "4" | "5" | "6") => {
                format!("<h{level}>{}</h{level}>", inner(), level = level)
            }
            _ => String::new(),
        },
        "image" => {
            let src = node.url.as_deref().unwrap_or("");
            let alt = node.alt.as_deref().unwrap_or("");
            format!(
                r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                html_escape(src),
                html_escape(alt)
            )
        }
        "embed" => {
            let embed = node.oembed.clone().unwrap_or_default();
            format!(
                r#"<div data-oembed="{}" data-oembed-type="{}">{}</div>"#,
                html_escape(embed.embed_url.as_deref().unwrap_or("")),
                html_escape(embed.kind.as_deref().unwrap_or("")),
                embed.html.unwrap_or_default()
            )
        }
        other => {
            tracing::debug!("Skipping unsupported rich text node: {}", other);
            String::new()
        }
    }
}

fn open_tag(span: &Span) -> String {
    let data = span.data.clone().unwrap_or_default();
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let url = html_escape(data.url.as_deref().unwrap_or(""));
            match data.target {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener noreferrer">"#,
                    url,
                    html_escape(&target)
                ),
                None => format!(r#"<a href="{}">"#, url),
            }
        }
        "label" => format!(
            r#"<span class="{}">"#,
            html_escape(data.label.as_deref().unwrap_or(""))
        ),
        _ => String::new(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        "label" => "</span>",
        _ => "",
    }
}

/// Apply spans to text, keeping the output well nested even when spans
/// overlap: a span that outlives one closing inside it is reopened.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut ordered: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    ordered.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<&Span> = Vec::new();
    let mut next = 0;

    // Text between two span boundaries is escaped as one run.
    let mut bounds: Vec<usize> = ordered
        .iter()
        .flat_map(|s| [s.start, s.end.min(len)])
        .chain([0, len])
        .collect();
    bounds.sort_unstable();
    bounds.dedup();

    for pair in bounds.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        close_ended(&mut out, &mut stack, from);

        while next < ordered.len() && ordered[next].start == from {
            out.push_str(&open_tag(ordered[next]));
            stack.push(ordered[next]);
            next += 1;
        }

        let run: String = chars[from..to].iter().collect();
        out.push_str(&html_escape(&run));
    }

    while let Some(span) = stack.pop() {
        out.push_str(close_tag(span));
    }

    out.replace('\n', "<br />")
}

fn close_ended<'a>(out: &mut String, stack: &mut Vec<&'a Span>, pos: usize) {
    let Some(first_ended) = stack.iter().position(|s| s.end <= pos) else {
        return;
    };

    // Unwind down to the outermost ended span, then reopen survivors.
    let unwound: Vec<&'a Span> = stack.drain(first_ended..).collect();
    for span in unwound.iter().rev() {
        out.push_str(close_tag(span));
    }
    for span in unwound.into_iter().filter(|s| s.end > pos) {
        out.push_str(&open_tag(span));
        stack.push(span);
    }
}
