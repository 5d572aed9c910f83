//! Rich-text document rendering for lead magnet content.
//!
//! Lead magnet descriptions arrive from the dashboard editor as a JSON
//! document tree (doc > blocks > inline nodes with marks). Rendering happens
//! server-side at artifact generation time so the client runtime only ever
//! handles a pre-escaped HTML string.
//!
//! Unknown node kinds are skipped but their children still render, so a
//! newer editor does not blank out existing content.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::sanitize::escape_html;

#[derive(Debug, Clone, Deserialize)]
struct Node {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<Node>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    marks: Vec<Mark>,
    #[serde(default)]
    attrs: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Clone, Deserialize)]
struct Mark {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attrs: serde_json::Map<String, JsonValue>,
}

/// Render a document tree to HTML. Returns an empty string when the value
/// is not a renderable document; callers treat empty as "no content".
pub fn render_document(value: &JsonValue) -> String {
    let Ok(root) = serde_json::from_value::<Node>(value.clone()) else {
        return String::new();
    };
    let mut out = String::new();
    render_node(&root, &mut out);
    out
}

fn render_node(node: &Node, out: &mut String) {
    match node.kind.as_str() {
        "doc" => render_children(node, out),
        "paragraph" => {
            out.push_str("<p>");
            render_children(node, out);
            out.push_str("</p>");
        }
        "heading" => {
            let level = node
                .attrs
                .get("level")
                .and_then(JsonValue::as_i64)
                .unwrap_or(1)
                .clamp(1, 6);
            out.push_str(&format!("<h{level}>"));
            render_children(node, out);
            out.push_str(&format!("</h{level}>"));
        }
        "bulletList" => {
            out.push_str("<ul>");
            render_children(node, out);
            out.push_str("</ul>");
        }
        "orderedList" => {
            out.push_str("<ol>");
            render_children(node, out);
            out.push_str("</ol>");
        }
        "listItem" => {
            out.push_str("<li>");
            render_children(node, out);
            out.push_str("</li>");
        }
        "hardBreak" => out.push_str("<br>"),
        "text" => {
            let text = node.text.as_deref().unwrap_or("");
            out.push_str(&apply_marks(&escape_html(text), &node.marks));
        }
        // Unknown block kind: drop the wrapper, keep the content
        _ => render_children(node, out),
    }
}

fn render_children(node: &Node, out: &mut String) {
    for child in &node.content {
        render_node(child, out);
    }
}

fn apply_marks(escaped_text: &str, marks: &[Mark]) -> String {
    let mut rendered = escaped_text.to_string();
    for mark in marks {
        rendered = match mark.kind.as_str() {
            "bold" => format!("<strong>{rendered}</strong>"),
            "italic" => format!("<em>{rendered}</em>"),
            "underline" => format!("<u>{rendered}</u>"),
            "strike" => format!("<s>{rendered}</s>"),
            "code" => format!("<code>{rendered}</code>"),
            "link" => match safe_href(&mark.attrs) {
                Some(href) => format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{rendered}</a>",
                    escape_html(&href)
                ),
                // Disallowed scheme: the text survives, the link does not
                None => rendered,
            },
            _ => rendered,
        };
    }
    rendered
}

fn safe_href(attrs: &serde_json::Map<String, JsonValue>) -> Option<String> {
    let href = attrs.get("href")?.as_str()?;
    let parsed = url::Url::parse(href).ok()?;
    match parsed.scheme() {
        "http" | "https" | "mailto" => Some(href.to_string()),
        _ => None,
    }
}
