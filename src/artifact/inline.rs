//! Inline script generation.
//!
//! Mounts one capture form per `[data-collecty-inline="<widget id>"]`
//! container on the host page, each in its own closed shadow root. Inline
//! instances are always visible: no trigger, no suppression cookie, no
//! auto-hide.

use super::{Artifact, ArtifactKind, DISPATCHER_JS, GEO_JS};
use crate::sanitize::{SanitizedWidget, escape_js};

/// Generate the inline-script artifact for a widget.
pub fn generate_inline_script(
    widget: &SanitizedWidget,
    base_url: &str,
    lead_magnet_html: Option<&str>,
) -> Artifact {
    let mut body = String::with_capacity(8 * 1024);

    body.push_str(&format!(
        "/* collecty widget {} (inline) */\n",
        widget.widget_id_str()
    ));
    body.push_str("(function () {\n  \"use strict\";\n\n");
    body.push_str(&var_block(widget, base_url, lead_magnet_html));
    body.push_str(GUARD_JS);
    body.push_str(UI_JS);
    body.push_str(GEO_JS);
    body.push_str(SUBMIT_JS);
    body.push_str(DISPATCHER_JS);
    body.push_str(BOOT_JS);
    body.push_str("})();\n");

    Artifact {
        kind: ArtifactKind::InlineScript,
        body,
    }
}

fn var_block(widget: &SanitizedWidget, base_url: &str, lead_magnet_html: Option<&str>) -> String {
    format!(
        concat!(
            "  var WIDGET_ID = \"{widget_id}\";\n",
            "  var PROJECT_ID = \"{project_id}\";\n",
            "  var SCOPE = \"{scope}\";\n",
            "  var SOURCE = \"inline\";\n",
            "  var SUBSCRIBE_URL = \"{subscribe_url}\";\n",
            "  var TITLE = \"{title}\";\n",
            "  var DESCRIPTION = \"{description}\";\n",
            "  var BUTTON_TEXT = \"{button_text}\";\n",
            "  var SUCCESS_MESSAGE = \"{success_message}\";\n",
            "  var PLACEHOLDER = \"{placeholder}\";\n",
            "  var PRIMARY_COLOR = \"{primary_color}\";\n",
            "  var BACKGROUND_COLOR = \"{background_color}\";\n",
            "  var TEXT_COLOR = \"{text_color}\";\n",
            "  var BORDER_RADIUS = {border_radius};\n",
            "  var LAYOUT = \"{layout}\";\n",
            "  var HAS_LEAD_MAGNET = {has_lead_magnet};\n",
            "  var LEAD_MAGNET_HTML = \"{lead_magnet_html}\";\n",
            "\n",
        ),
        widget_id = widget.widget_id_str(),
        project_id = widget.project_id_str(),
        scope = widget.scope(),
        subscribe_url = escape_js(&format!("{}/api/v1/subscribe", base_url)),
        title = widget.title.as_js_in_html(),
        description = widget.description.as_js_in_html(),
        button_text = widget.button_text.as_js_in_html(),
        success_message = widget.success_message.as_js_in_html(),
        placeholder = widget.placeholder.as_js_in_html(),
        primary_color = escape_js(widget.primary_color.as_css()),
        background_color = escape_js(widget.background_color.as_css()),
        text_color = escape_js(widget.text_color.as_css()),
        border_radius = widget.border_radius,
        layout = widget.layout.as_str(),
        has_lead_magnet = lead_magnet_html.is_some(),
        lead_magnet_html = escape_js(lead_magnet_html.unwrap_or("")),
    )
}

const GUARD_JS: &str = r##"  window.__collectyLoaded = window.__collectyLoaded || {};
  if (window.__collectyLoaded[WIDGET_ID + ":" + SOURCE]) { return; }
  window.__collectyLoaded[WIDGET_ID + ":" + SOURCE] = true;

"##;

const UI_JS: &str = r##"  function buildStyles() {
    var direction = LAYOUT === "horizontal" ? "row" : "column";
    return "" +
      ":host { all: initial; }" +
      "." + SCOPE + "-card { background: " + BACKGROUND_COLOR + "; color: " + TEXT_COLOR + ";" +
      " border-radius: " + BORDER_RADIUS + "px; padding: 20px; box-sizing: border-box;" +
      " font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; }" +
      "." + SCOPE + "-title { margin: 0 0 8px; font-size: 18px; font-weight: 700; }" +
      "." + SCOPE + "-description { margin: 0 0 14px; font-size: 14px; line-height: 1.5; }" +
      "." + SCOPE + "-form { display: flex; flex-direction: " + direction + "; gap: 8px; }" +
      "." + SCOPE + "-email { flex: 1 1 auto; padding: 10px 12px; font-size: 14px;" +
      " border: 1px solid rgba(17, 24, 39, 0.2); border-radius: 6px; outline: none; }" +
      "." + SCOPE + "-email:focus { border-color: " + PRIMARY_COLOR + "; }" +
      "." + SCOPE + "-submit { padding: 10px 16px; font-size: 14px; font-weight: 600; border: 0;" +
      " border-radius: 6px; cursor: pointer; background: " + PRIMARY_COLOR + "; color: #ffffff; }" +
      "." + SCOPE + "-submit:disabled { opacity: 0.7; cursor: default; }" +
      "." + SCOPE + "-note { margin: 10px 0 0; font-size: 13px; min-height: 1em; }" +
      "." + SCOPE + "-success { color: #15803d; }" +
      "." + SCOPE + "-error { color: #b91c1c; }" +
      "." + SCOPE + "-body a { color: " + PRIMARY_COLOR + "; }";
  }

  function buildMarkup() {
    return "" +
      '<div class="' + SCOPE + '-card">' +
      '<div class="' + SCOPE + '-body" id="' + SCOPE + '-body">' +
      '<h2 class="' + SCOPE + '-title">' + TITLE + '</h2>' +
      '<p class="' + SCOPE + '-description">' + DESCRIPTION + '</p>' +
      '<form class="' + SCOPE + '-form" id="' + SCOPE + '-form">' +
      '<input class="' + SCOPE + '-email" id="' + SCOPE + '-email" type="email" required placeholder="' + PLACEHOLDER + '" />' +
      '<button class="' + SCOPE + '-submit" id="' + SCOPE + '-submit" type="submit">' + BUTTON_TEXT + '</button>' +
      '</form>' +
      '<p class="' + SCOPE + '-note" id="' + SCOPE + '-note" role="status"></p>' +
      '</div></div>';
  }

  function mountOne(container) {
    if (container.getAttribute("data-collecty-mounted") === "1") { return; }
    container.setAttribute("data-collecty-mounted", "1");

    var host = document.createElement("div");
    var root = host.attachShadow({ mode: "closed" });

    var style = document.createElement("style");
    style.textContent = buildStyles();
    root.appendChild(style);

    var wrapper = document.createElement("div");
    wrapper.innerHTML = buildMarkup();
    root.appendChild(wrapper.firstChild);
    container.appendChild(host);

    var card = root.querySelector("." + SCOPE + "-card");
    var stopEvents = ["click", "keydown", "input", "focus", "blur"];
    for (var i = 0; i < stopEvents.length; i++) {
      card.addEventListener(stopEvents[i], function (event) { event.stopPropagation(); }, true);
    }

    root.querySelector("#" + SCOPE + "-form").addEventListener("submit", makeSubmitHandler(root));
  }

  function mountAll() {
    var containers = document.querySelectorAll('[data-collecty-inline="' + WIDGET_ID + '"]');
    for (var i = 0; i < containers.length; i++) {
      mountOne(containers[i]);
    }
  }

"##;

const SUBMIT_JS: &str = r##"  function onSuccess(root, input, note) {
    if (HAS_LEAD_MAGNET) {
      var body = root.querySelector("#" + SCOPE + "-body");
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

  function makeSubmitHandler(root) {
    return function (event) {
      event.preventDefault();
      var input = root.querySelector("#" + SCOPE + "-email");
      var note = root.querySelector("#" + SCOPE + "-note");
      var button = root.querySelector("#" + SCOPE + "-submit");
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
          if (response.ok) { onSuccess(root, input, note); } else { onFailure(note, payload); }
        });
      }).catch(function () {
        onFailure(note, null);
      }).then(function () {
        button.disabled = false;
        button.innerHTML = restingLabel;
      });
    };
  }

"##;

const BOOT_JS: &str = r##"
  installDispatcher({ init: mountAll });

  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", mountAll);
  } else {
    mountAll();
  }
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::widget;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_model() -> widget::Model {
        widget::Model {
            id: Uuid::parse_str("0e35f1a2-65cb-47f9-8f3a-52c4d46ad1c7").unwrap(),
            project_id: Uuid::new_v4(),
            name: "inline sample".to_string(),
            title: None,
            description: None,
            button_text: None,
            success_message: None,
            placeholder: None,
            primary_color: None,
            background_color: None,
            text_color: None,
            border_radius: None,
            position: None,
            trigger_type: None,
            trigger_value: None,
            layout: Some("horizontal".to_string()),
            lead_magnet_id: None,
            is_default: false,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let sanitized = SanitizedWidget::from_model(&sample_model());
        let a = generate_inline_script(&sanitized, "https://app.collecty.io", None);
        let b = generate_inline_script(&sanitized, "https://app.collecty.io", None);
        assert_eq!(a.body, b.body);
    }

    #[test]
    fn test_defaults_fill_missing_config() {
        let sanitized = SanitizedWidget::from_model(&sample_model());
        let artifact = generate_inline_script(&sanitized, "https://app.collecty.io", None);

        assert!(artifact.body.contains("var TITLE = \"Join our newsletter\";"));
        assert!(artifact.body.contains("var BUTTON_TEXT = \"Subscribe\";"));
        assert!(artifact.body.contains("var PLACEHOLDER = \"Enter your email\";"));
        assert!(artifact.body.contains("var PRIMARY_COLOR = \"#4f46e5\";"));
        assert!(artifact.body.contains("var BORDER_RADIUS = 8;"));
        assert!(artifact.body.contains("var LAYOUT = \"horizontal\";"));
    }

    #[test]
    fn test_mounts_by_container_attribute() {
        let sanitized = SanitizedWidget::from_model(&sample_model());
        let artifact = generate_inline_script(&sanitized, "https://app.collecty.io", None);

        assert!(artifact.body.contains("data-collecty-inline"));
        assert!(artifact.body.contains("data-collecty-mounted"));
        assert!(artifact.body.contains("var SOURCE = \"inline\";"));
        assert_eq!(artifact.kind, ArtifactKind::InlineScript);
    }

    #[test]
    fn test_inline_has_no_cookie_or_trigger() {
        let sanitized = SanitizedWidget::from_model(&sample_model());
        let artifact = generate_inline_script(&sanitized, "https://app.collecty.io", None);

        assert!(!artifact.body.contains("collecty_shown_"));
        assert!(!artifact.body.contains("document.cookie"));
        assert!(!artifact.body.contains("TRIGGER_TYPE"));
        assert!(!artifact.body.contains("setTimeout(hide"));
    }
}
