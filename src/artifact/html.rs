//! Inline HTML snippet generation.
//!
//! The snippet is a single `<div>` carrying its own `<style>` and submit
//! `<script>`, for hosts that cannot load external scripts (iframes,
//! restrictive CMS blocks). No shadow DOM is available here, so every id
//! and class carries the widget's scope prefix instead.

use super::{Artifact, ArtifactKind, GEO_JS};
use crate::sanitize::{InlineLayout, SanitizedWidget, escape_js};

/// Generate the self-contained HTML artifact for a widget.
pub fn generate_inline_html(
    widget: &SanitizedWidget,
    base_url: &str,
    lead_magnet_html: Option<&str>,
) -> Artifact {
    let scope = widget.scope();
    let mut body = String::with_capacity(8 * 1024);

    body.push_str(&format!(
        "<!-- collecty widget {} (inline html) -->\n",
        widget.widget_id_str()
    ));
    body.push_str(&format!("<div class=\"{}-wrap\">\n", scope));
    body.push_str(&style_block(widget, &scope));
    body.push_str(&markup_block(widget, &scope));
    body.push_str("<script>\n(function () {\n  \"use strict\";\n\n");
    body.push_str(&var_block(widget, base_url, lead_magnet_html));
    body.push_str(GEO_JS);
    body.push_str(SUBMIT_JS);
    body.push_str("})();\n</script>\n</div>\n");

    Artifact {
        kind: ArtifactKind::InlineHtml,
        body,
    }
}

fn style_block(widget: &SanitizedWidget, scope: &str) -> String {
    let direction = match widget.layout {
        InlineLayout::Horizontal => "row",
        InlineLayout::Vertical => "column",
    };

    format!(
        concat!(
            "<style>\n",
            ".{scope}-wrap {{ background: {background}; color: {text}; border-radius: {radius}px;",
            " padding: 20px; box-sizing: border-box;",
            " font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; }}\n",
            ".{scope}-title {{ margin: 0 0 8px; font-size: 18px; font-weight: 700; }}\n",
            ".{scope}-description {{ margin: 0 0 14px; font-size: 14px; line-height: 1.5; }}\n",
            ".{scope}-form {{ display: flex; flex-direction: {direction}; gap: 8px; }}\n",
            ".{scope}-email {{ flex: 1 1 auto; padding: 10px 12px; font-size: 14px;",
            " border: 1px solid rgba(17, 24, 39, 0.2); border-radius: 6px; outline: none; }}\n",
            ".{scope}-email:focus {{ border-color: {primary}; }}\n",
            ".{scope}-submit {{ padding: 10px 16px; font-size: 14px; font-weight: 600; border: 0;",
            " border-radius: 6px; cursor: pointer; background: {primary}; color: #ffffff; }}\n",
            ".{scope}-submit:disabled {{ opacity: 0.7; cursor: default; }}\n",
            ".{scope}-note {{ margin: 10px 0 0; font-size: 13px; min-height: 1em; }}\n",
            ".{scope}-success {{ color: #15803d; }}\n",
            ".{scope}-error {{ color: #b91c1c; }}\n",
            ".{scope}-body a {{ color: {primary}; }}\n",
            "</style>\n",
        ),
        scope = scope,
        background = widget.background_color.as_css(),
        text = widget.text_color.as_css(),
        primary = widget.primary_color.as_css(),
        radius = widget.border_radius,
        direction = direction,
    )
}

fn markup_block(widget: &SanitizedWidget, scope: &str) -> String {
    format!(
        concat!(
            "<div class=\"{scope}-body\" id=\"{scope}-body\">\n",
            "<h2 class=\"{scope}-title\">{title}</h2>\n",
            "<p class=\"{scope}-description\">{description}</p>\n",
            "<form class=\"{scope}-form\" id=\"{scope}-form\">\n",
            "<input class=\"{scope}-email\" id=\"{scope}-email\" type=\"email\" required placeholder=\"{placeholder}\" />\n",
            "<button class=\"{scope}-submit\" id=\"{scope}-submit\" type=\"submit\">{button}</button>\n",
            "</form>\n",
            "<p class=\"{scope}-note\" id=\"{scope}-note\" role=\"status\"></p>\n",
            "</div>\n",
        ),
        scope = scope,
        title = widget.title.as_html(),
        description = widget.description.as_html(),
        placeholder = widget.placeholder.as_html(),
        button = widget.button_text.as_html(),
    )
}

fn var_block(widget: &SanitizedWidget, base_url: &str, lead_magnet_html: Option<&str>) -> String {
    format!(
        concat!(
            "  var WIDGET_ID = \"{widget_id}\";\n",
            "  var PROJECT_ID = \"{project_id}\";\n",
            "  var SCOPE = \"{scope}\";\n",
            "  var SOURCE = \"inline-html\";\n",
            "  var SUBSCRIBE_URL = \"{subscribe_url}\";\n",
            "  var SUCCESS_MESSAGE = \"{success_message}\";\n",
            "  var HAS_LEAD_MAGNET = {has_lead_magnet};\n",
            "  var LEAD_MAGNET_HTML = \"{lead_magnet_html}\";\n",
            "\n",
        ),
        widget_id = widget.widget_id_str(),
        project_id = widget.project_id_str(),
        scope = widget.scope(),
        subscribe_url = escape_js(&format!("{}/api/v1/subscribe", base_url)),
        success_message = widget.success_message.as_js_in_html(),
        has_lead_magnet = lead_magnet_html.is_some(),
        lead_magnet_html = escape_js(lead_magnet_html.unwrap_or("")),
    )
}

const SUBMIT_JS: &str = r##"  function byId(suffix) {
    return document.getElementById(SCOPE + suffix);
  }

  function onSuccess(input, note) {
    if (HAS_LEAD_MAGNET) {
      var body = byId("-body");
      if (body) { body.innerHTML = LEAD_MAGNET_HTML; }
      return;
    }
    if (note) {
      note.innerHTML = SUCCESS_MESSAGE;
      note.className = SCOPE + "-note " + SCOPE + "-success";
    }
    if (input) { input.value = ""; }
  }

  function onFailure(note, payload) {
    if (!note) { return; }
    note.textContent = payload && payload.message ? payload.message : "Something went wrong. Please try again.";
    note.className = SCOPE + "-note " + SCOPE + "-error";
  }

  function handleSubmit(event) {
    event.preventDefault();
    var input = byId("-email");
    var note = byId("-note");
    var button = byId("-submit");
    var email = input && input.value ? input.value.trim() : "";
    if (!email || !button) { return; }

    var restingLabel = button.innerHTML;
    button.disabled = true;
    button.innerHTML = "...";

    lookupGeo().then(function (geo) {
      return window.fetch(SUBSCRIBE_URL, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({
          email: email,
          projectId: PROJECT_ID,
          widgetId: WIDGET_ID,
          metadata: buildMetadata(geo)
        })
      });
    }).then(function (response) {
      return response.json().catch(function () { return {}; }).then(function (payload) {
        if (response.ok) { onSuccess(input, note); } else { onFailure(note, payload); }
      });
    }).catch(function () {
      onFailure(note, null);
    }).then(function () {
      button.disabled = false;
      button.innerHTML = restingLabel;
    });
  }

  var form = byId("-form");
  if (form && form.getAttribute("data-collecty-bound") !== "1") {
    form.setAttribute("data-collecty-bound", "1");
    form.addEventListener("submit", handleSubmit);
  }
"##;
