//! Popup script generation.
//!
//! The emitted program mounts an overlay dialog into a closed shadow root,
//! arms the configured trigger, suppresses re-display through a per-widget
//! cookie and submits signups with best-effort geolocation enrichment. The
//! whole runtime below the `var` block is a fixed byte string.

use super::{Artifact, ArtifactKind, DISPATCHER_JS, GEO_JS};
use crate::sanitize::{SanitizedWidget, escape_js};

/// Generate the popup artifact for a widget.
///
/// `lead_magnet_html` is the pre-rendered reveal content; it is embedded as
/// one JS string constant and injected verbatim on success.
pub fn generate_popup_script(
    widget: &SanitizedWidget,
    base_url: &str,
    lead_magnet_html: Option<&str>,
) -> Artifact {
    let mut body = String::with_capacity(12 * 1024);

    body.push_str(&format!(
        "/* collecty widget {} (popup) */\n",
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
        kind: ArtifactKind::PopupScript,
        body,
    }
}

fn var_block(widget: &SanitizedWidget, base_url: &str, lead_magnet_html: Option<&str>) -> String {
    format!(
        concat!(
            "  var WIDGET_ID = \"{widget_id}\";\n",
            "  var PROJECT_ID = \"{project_id}\";\n",
            "  var SCOPE = \"{scope}\";\n",
            "  var SOURCE = \"popup\";\n",
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
            "  var POSITION = \"{position}\";\n",
            "  var TRIGGER_TYPE = \"{trigger_type}\";\n",
            "  var TRIGGER_VALUE = {trigger_value};\n",
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
        position = widget.position.as_str(),
        trigger_type = widget.trigger.as_str(),
        trigger_value = widget.trigger_value,
        has_lead_magnet = lead_magnet_html.is_some(),
        lead_magnet_html = escape_js(lead_magnet_html.unwrap_or("")),
    )
}

/// Idempotence guard. Keyed by widget id and variant so the popup and
/// inline scripts of one widget can share a page, while a double-injected
/// copy of the same script stays inert.
const GUARD_JS: &str = r##"  window.__collectyLoaded = window.__collectyLoaded || {};
  if (window.__collectyLoaded[WIDGET_ID + ":" + SOURCE]) { return; }
  window.__collectyLoaded[WIDGET_ID + ":" + SOURCE] = true;

"##;

const UI_JS: &str = r##"  var COOKIE_NAME = "collecty_shown_" + WIDGET_ID;
  var host = null;
  var root = null;
  var triggerArmed = false;

  function readCookie(name) {
    var parts = document.cookie ? document.cookie.split("; ") : [];
    for (var i = 0; i < parts.length; i++) {
      var eq = parts[i].indexOf("=");
      if (eq > 0 && parts[i].substring(0, eq) === name) {
        return parts[i].substring(eq + 1);
      }
    }
    return null;
  }

  function writeCookie(name, value, maxAge) {
    document.cookie = name + "=" + value + "; path=/; max-age=" + maxAge + "; SameSite=Lax";
  }

  function clearCookie(name) {
    document.cookie = name + "=; path=/; max-age=0; SameSite=Lax";
  }

  function positionStyles() {
    if (POSITION === "top-left") { return "align-items: flex-start; justify-content: flex-start;"; }
    if (POSITION === "top-right") { return "align-items: flex-start; justify-content: flex-end;"; }
    if (POSITION === "bottom-left") { return "align-items: flex-end; justify-content: flex-start;"; }
    if (POSITION === "bottom-right") { return "align-items: flex-end; justify-content: flex-end;"; }
    return "align-items: center; justify-content: center;";
  }

  function buildStyles() {
    return "" +
      ":host { all: initial; }" +
      "." + SCOPE + "-overlay { position: fixed; inset: 0; z-index: 2147483000; display: none;" +
      " background: rgba(17, 24, 39, 0.45); padding: 24px; box-sizing: border-box; " + positionStyles() + " }" +
      "." + SCOPE + "-overlay." + SCOPE + "-open { display: flex; }" +
      "." + SCOPE + "-popup { background: " + BACKGROUND_COLOR + "; color: " + TEXT_COLOR + ";" +
      " border-radius: " + BORDER_RADIUS + "px; padding: 28px; max-width: 400px; width: 100%;" +
      " box-shadow: 0 20px 50px rgba(0, 0, 0, 0.25); position: relative; box-sizing: border-box;" +
      " font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; }" +
      "." + SCOPE + "-close { position: absolute; top: 10px; right: 14px; border: 0; background: none;" +
      " font-size: 22px; line-height: 1; cursor: pointer; color: inherit; opacity: 0.6; }" +
      "." + SCOPE + "-close:hover { opacity: 1; }" +
      "." + SCOPE + "-title { margin: 0 0 8px; font-size: 20px; font-weight: 700; }" +
      "." + SCOPE + "-description { margin: 0 0 16px; font-size: 14px; line-height: 1.5; }" +
      "." + SCOPE + "-form { display: flex; flex-direction: column; gap: 8px; }" +
      "." + SCOPE + "-email { padding: 10px 12px; font-size: 14px; border: 1px solid rgba(17, 24, 39, 0.2);" +
      " border-radius: 6px; outline: none; }" +
      "." + SCOPE + "-email:focus { border-color: " + PRIMARY_COLOR + "; }" +
      "." + SCOPE + "-submit { padding: 10px 12px; font-size: 14px; font-weight: 600; border: 0;" +
      " border-radius: 6px; cursor: pointer; background: " + PRIMARY_COLOR + "; color: #ffffff; }" +
      "." + SCOPE + "-submit:disabled { opacity: 0.7; cursor: default; }" +
      "." + SCOPE + "-note { margin: 10px 0 0; font-size: 13px; min-height: 1em; }" +
      "." + SCOPE + "-success { color: #15803d; }" +
      "." + SCOPE + "-error { color: #b91c1c; }" +
      "." + SCOPE + "-body a { color: " + PRIMARY_COLOR + "; }";
  }

  function buildMarkup() {
    return "" +
      '<div class="' + SCOPE + '-overlay" id="' + SCOPE + '-overlay">' +
      '<div class="' + SCOPE + '-popup" role="dialog" aria-modal="true">' +
      '<button type="button" class="' + SCOPE + '-close" id="' + SCOPE + '-close" aria-label="Close">&times;</button>' +
      '<div class="' + SCOPE + '-body" id="' + SCOPE + '-body">' +
      '<h2 class="' + SCOPE + '-title">' + TITLE + '</h2>' +
      '<p class="' + SCOPE + '-description">' + DESCRIPTION + '</p>' +
      '<form class="' + SCOPE + '-form" id="' + SCOPE + '-form">' +
      '<input class="' + SCOPE + '-email" id="' + SCOPE + '-email" type="email" required placeholder="' + PLACEHOLDER + '" />' +
      '<button class="' + SCOPE + '-submit" id="' + SCOPE + '-submit" type="submit">' + BUTTON_TEXT + '</button>' +
      '</form>' +
      '<p class="' + SCOPE + '-note" id="' + SCOPE + '-note" role="status"></p>' +
      '</div></div></div>';
  }

  function mount() {
    if (root) { return; }
    host = document.createElement("div");
    host.setAttribute("data-collecty-widget", WIDGET_ID);
    root = host.attachShadow({ mode: "closed" });

    var style = document.createElement("style");
    style.textContent = buildStyles();
    root.appendChild(style);

    var wrapper = document.createElement("div");
    wrapper.innerHTML = buildMarkup();
    root.appendChild(wrapper.firstChild);
    document.body.appendChild(host);

    var overlay = root.querySelector("#" + SCOPE + "-overlay");
    var stopEvents = ["click", "keydown", "input", "focus", "blur"];
    for (var i = 0; i < stopEvents.length; i++) {
      overlay.addEventListener(stopEvents[i], function (event) { event.stopPropagation(); }, true);
    }

    root.querySelector("#" + SCOPE + "-close").addEventListener("click", dismiss);
    root.querySelector("#" + SCOPE + "-form").addEventListener("submit", handleSubmit);
  }

  function show() {
    mount();
    var overlay = root.querySelector("#" + SCOPE + "-overlay");
    if (overlay) { overlay.className = SCOPE + "-overlay " + SCOPE + "-open"; }
  }

  function hide() {
    if (!root) { return; }
    var overlay = root.querySelector("#" + SCOPE + "-overlay");
    if (overlay) { overlay.className = SCOPE + "-overlay"; }
  }

  function dismiss() {
    writeCookie(COOKIE_NAME, "1", 86400);
    hide();
  }

  function reset() {
    clearCookie(COOKIE_NAME);
  }

  function armTrigger() {
    if (triggerArmed || readCookie(COOKIE_NAME)) { return; }
    triggerArmed = true;

    if (TRIGGER_TYPE === "scroll") {
      var onScroll = function () {
        var scrollable = document.documentElement.scrollHeight - window.innerHeight;
        var fraction = scrollable > 0 ? window.scrollY / scrollable : 1;
        if (fraction * 100 >= TRIGGER_VALUE) {
          window.removeEventListener("scroll", onScroll);
          show();
        }
      };
      window.addEventListener("scroll", onScroll);
      onScroll();
    } else if (TRIGGER_TYPE === "exit-intent") {
      var onLeave = function (event) {
        if (event.clientY <= 0) {
          document.removeEventListener("mouseleave", onLeave);
          show();
        }
      };
      document.addEventListener("mouseleave", onLeave);
    } else if (TRIGGER_TYPE === "click") {
      /* shown through window.collecty only */
    } else {
      window.setTimeout(show, TRIGGER_VALUE * 1000);
    }
  }

  function init() {
    mount();
    armTrigger();
  }

"##;

const SUBMIT_JS: &str = r##"  function onSuccess(input, note) {
    writeCookie(COOKIE_NAME, "1", 86400);
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
    window.setTimeout(hide, 2500);
  }

  function onFailure(note, payload) {
    if (!note) { return; }
    note.textContent = payload && payload.message ? payload.message : "Something went wrong. Please try again.";
    note.className = SCOPE + "-note " + SCOPE + "-error";
  }

  function handleSubmit(event) {
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
        if (response.ok) { onSuccess(input, note); } else { onFailure(note, payload); }
      });
    }).catch(function () {
      onFailure(note, null);
    }).then(function () {
      button.disabled = false;
      button.innerHTML = restingLabel;
    });
  }

"##;

const BOOT_JS: &str = r##"
  installDispatcher({ show: show, hide: hide, init: init, reset: reset });

  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", init);
  } else {
    init();
  }
"##;
