//! Context-aware sanitization for widget configuration values.
//!
//! Every tenant-controlled value crosses a trust boundary when it is
//! interpolated into generated JavaScript or HTML, so each value is wrapped
//! in a type that only exposes escaped renditions for its target context.
//! Sanitizers never fail: invalid input degrades to a documented default so
//! a half-broken dashboard config still produces a working embed.

use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

use crate::models::widget;

/// Escape HTML metacharacters for element content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a value for embedding inside a quoted JS string literal that
/// itself sits inside a `<script>` block.
///
/// Angle brackets become unicode escapes so the literal can never form a
/// `</script>` terminator. U+2028/U+2029 are line terminators in JS source
/// even though JSON allows them raw.
pub fn escape_js(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out
}

/// Free-form tenant text, trimmed and bounded but not yet escaped.
///
/// The raw value is private; generators must pick [`PlainText::as_html`] or
/// [`PlainText::as_js_in_html`], so unescaped text cannot reach a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainText {
    value: String,
}

impl PlainText {
    /// Trim, fall back to `default` when empty, and cut at `max_len` chars.
    pub fn new(raw: Option<&str>, default: &str, max_len: usize) -> Self {
        let trimmed = raw.map(str::trim).unwrap_or("");
        let chosen = if trimmed.is_empty() { default } else { trimmed };
        let value = if chosen.chars().count() > max_len {
            chosen.chars().take(max_len).collect()
        } else {
            chosen.to_string()
        };
        Self { value }
    }

    /// Entity-escaped rendition for direct HTML interpolation.
    pub fn as_html(&self) -> String {
        escape_html(&self.value)
    }

    /// Rendition for a JS string constant whose value is later assigned via
    /// `innerHTML`: entity-escape first, then JS-escape the result.
    pub fn as_js_in_html(&self) -> String {
        escape_js(&escape_html(&self.value))
    }

    #[cfg(test)]
    pub fn plain(&self) -> &str {
        &self.value
    }
}

fn color_grammar() -> &'static Regex {
    static COLOR_RE: OnceLock<Regex> = OnceLock::new();
    COLOR_RE.get_or_init(|| {
        // Hex (3/4/6/8 digits), functional rgb/rgba/hsl/hsla with a benign
        // character set, or a bare keyword. Everything else is rejected,
        // which keeps `;`, `}` and `url(` out of generated <style> blocks.
        Regex::new(
            r"^(?:#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})|(?:rgb|rgba|hsl|hsla)\([0-9,.%\s/]*\)|[a-zA-Z]+)$",
        )
        .unwrap()
    })
}

/// A CSS color value validated against a whitelist grammar at construction.
///
/// The held value interpolates into `<style>` without further escaping;
/// the grammar is the only guard, so it stays strict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssColor {
    value: String,
}

impl CssColor {
    pub fn new(raw: Option<&str>, default: &'static str) -> Self {
        let trimmed = raw.map(str::trim).unwrap_or("");
        let value = if !trimmed.is_empty() && color_grammar().is_match(trimmed) {
            trimmed.to_string()
        } else {
            default.to_string()
        };
        Self { value }
    }

    pub fn as_css(&self) -> &str {
        &self.value
    }
}

/// How a popup decides to show itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Delay,
    Scroll,
    ExitIntent,
    Click,
}

impl TriggerKind {
    /// Case-insensitive membership check; unknown values mean [`Self::Delay`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("scroll") => Self::Scroll,
            Some("exit-intent") => Self::ExitIntent,
            Some("click") => Self::Click,
            _ => Self::Delay,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delay => "delay",
            Self::Scroll => "scroll",
            Self::ExitIntent => "exit-intent",
            Self::Click => "click",
        }
    }
}

/// Popup placement on the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupPosition {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl PopupPosition {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("top-left") => Self::TopLeft,
            Some("top-right") => Self::TopRight,
            Some("bottom-left") => Self::BottomLeft,
            Some("bottom-right") => Self::BottomRight,
            _ => Self::Center,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

/// Inline form arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineLayout {
    Horizontal,
    Vertical,
}

impl InlineLayout {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("horizontal") => Self::Horizontal,
            _ => Self::Vertical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

/// Coerce an optional numeric config value into `[min, max]`.
pub fn clamp_number(raw: Option<i32>, min: i32, max: i32, default: i32) -> i32 {
    raw.unwrap_or(default).clamp(min, max)
}

/// Parse a widget or project id in strict hyphenated form only.
///
/// `Uuid::parse_str` also accepts simple, braced and URN forms; the public
/// artifact URLs commit to exactly one spelling, so the shape is checked
/// before delegating.
pub fn parse_widget_id(raw: &str) -> Option<Uuid> {
    let bytes = raw.as_bytes();
    if bytes.len() != 36 {
        return None;
    }
    for (i, b) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if *b != b'-' {
                    return None;
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() {
                    return None;
                }
            }
        }
    }
    Uuid::parse_str(raw).ok()
}

const DEFAULT_TITLE: &str = "Join our newsletter";
const DEFAULT_DESCRIPTION: &str = "Get the latest updates straight to your inbox.";
const DEFAULT_BUTTON_TEXT: &str = "Subscribe";
const DEFAULT_SUCCESS_MESSAGE: &str = "Thanks for subscribing!";
const DEFAULT_PLACEHOLDER: &str = "Enter your email";
const DEFAULT_PRIMARY_COLOR: &str = "#4f46e5";
const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
const DEFAULT_TEXT_COLOR: &str = "#111827";

const DEFAULT_BORDER_RADIUS: i32 = 8;
const DEFAULT_DELAY_SECONDS: i32 = 5;
const DEFAULT_SCROLL_PERCENT: i32 = 50;

/// A widget row with every field passed through its context sanitizer.
///
/// This is the only input type the artifact generators accept.
#[derive(Debug, Clone)]
pub struct SanitizedWidget {
    pub widget_id: Uuid,
    pub project_id: Uuid,
    pub title: PlainText,
    pub description: PlainText,
    pub button_text: PlainText,
    pub success_message: PlainText,
    pub placeholder: PlainText,
    pub primary_color: CssColor,
    pub background_color: CssColor,
    pub text_color: CssColor,
    pub border_radius: i32,
    pub position: PopupPosition,
    pub trigger: TriggerKind,
    pub trigger_value: i32,
    pub layout: InlineLayout,
}

impl SanitizedWidget {
    pub fn from_model(model: &widget::Model) -> Self {
        let trigger = TriggerKind::parse(model.trigger_type.as_deref());
        let trigger_value = match trigger {
            TriggerKind::Delay => {
                clamp_number(model.trigger_value, 0, 120, DEFAULT_DELAY_SECONDS)
            }
            TriggerKind::Scroll => {
                clamp_number(model.trigger_value, 0, 100, DEFAULT_SCROLL_PERCENT)
            }
            TriggerKind::ExitIntent | TriggerKind::Click => 0,
        };

        Self {
            widget_id: model.id,
            project_id: model.project_id,
            title: PlainText::new(model.title.as_deref(), DEFAULT_TITLE, 200),
            description: PlainText::new(model.description.as_deref(), DEFAULT_DESCRIPTION, 500),
            button_text: PlainText::new(model.button_text.as_deref(), DEFAULT_BUTTON_TEXT, 100),
            success_message: PlainText::new(
                model.success_message.as_deref(),
                DEFAULT_SUCCESS_MESSAGE,
                300,
            ),
            placeholder: PlainText::new(model.placeholder.as_deref(), DEFAULT_PLACEHOLDER, 150),
            primary_color: CssColor::new(model.primary_color.as_deref(), DEFAULT_PRIMARY_COLOR),
            background_color: CssColor::new(
                model.background_color.as_deref(),
                DEFAULT_BACKGROUND_COLOR,
            ),
            text_color: CssColor::new(model.text_color.as_deref(), DEFAULT_TEXT_COLOR),
            border_radius: clamp_number(model.border_radius, 0, 32, DEFAULT_BORDER_RADIUS),
            position: PopupPosition::parse(model.position.as_deref()),
            trigger,
            trigger_value,
            layout: InlineLayout::parse(model.layout.as_deref()),
        }
    }

    /// CSS/DOM identifier prefix scoping generated markup to this widget.
    pub fn scope(&self) -> String {
        format!("collecty-{}", &self.widget_id.simple().to_string()[..8])
    }

    /// Hyphenated widget id, safe for direct interpolation.
    pub fn widget_id_str(&self) -> String {
        self.widget_id.to_string()
    }

    /// Hyphenated project id, safe for direct interpolation.
    pub fn project_id_str(&self) -> String {
        self.project_id.to_string()
    }
}
