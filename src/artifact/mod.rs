//! Widget artifact synthesis.
//!
//! Three renditions of one widget row: the popup script, the inline script,
//! and the self-contained HTML snippet. Generators are pure functions of the
//! sanitized config, the public base URL and the pre-rendered lead magnet,
//! so identical inputs always produce byte-identical artifacts.
//!
//! Code-generation discipline, enforced across all three templates:
//! every externally influenced value enters the script through one `var`
//! block at the top; the runtime below that block is a fixed byte string.

pub mod html;
pub mod inline;
pub mod popup;

pub use html::generate_inline_html;
pub use inline::generate_inline_script;
pub use popup::generate_popup_script;

/// The three renditions a widget can be served as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Overlay script with triggers and suppression cookie
    PopupScript,
    /// Script that mounts into host-page containers
    InlineScript,
    /// Script-tag-free snippet for iframe or server-side embedding
    InlineHtml,
}

impl ArtifactKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::PopupScript | Self::InlineScript => "application/javascript; charset=utf-8",
            Self::InlineHtml => "text/html; charset=utf-8",
        }
    }

    /// Scripts re-fetch every load so config edits take effect immediately;
    /// the snippet tolerates short staleness in exchange for CDN caching.
    pub fn cache_control(&self) -> &'static str {
        match self {
            Self::PopupScript | Self::InlineScript => "no-store",
            Self::InlineHtml => "public, max-age=300, stale-while-revalidate=60",
        }
    }

    /// Scripts must never be framed; the HTML snippet exists to be framed.
    pub fn is_script(&self) -> bool {
        matches!(self, Self::PopupScript | Self::InlineScript)
    }

    pub fn source_tag(&self) -> &'static str {
        match self {
            Self::PopupScript => "popup",
            Self::InlineScript => "inline",
            Self::InlineHtml => "inline-html",
        }
    }
}

/// A generated artifact body plus the kind that dictates its headers.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub body: String,
}

/// A valid-but-inert body in the artifact's own syntax.
///
/// Delivery failures (bad id, throttled, unknown or inactive widget) respond
/// with one of these so an embedding page never renders a broken script tag
/// or an error page inside its layout. `note` must be fixed text, never
/// request-derived.
pub fn inert_comment(kind: ArtifactKind, note: &str) -> String {
    match kind {
        ArtifactKind::PopupScript | ArtifactKind::InlineScript => {
            format!("/* collecty: {} */\n", note)
        }
        ArtifactKind::InlineHtml => format!("<!-- collecty: {} -->\n", note),
    }
}

/// Dispatcher install shared by both scripts. Either artifact can load
/// first; whichever runs first replaces the host-page stub and replays its
/// queued calls. Expects `WIDGET_ID` and a `handlers` object in scope.
pub(crate) const DISPATCHER_JS: &str = r#"  function installDispatcher(handlers) {
    window.__collectyWidgets = window.__collectyWidgets || {};
    window.__collectyWidgets[WIDGET_ID] = handlers;
    var existing = window.collecty;
    if (existing && existing.dispatcherInstalled) { return; }
    var dispatch = function (action, widgetId) {
      var registry = window.__collectyWidgets || {};
      if (widgetId) {
        if (registry[widgetId] && typeof registry[widgetId][action] === "function") {
          registry[widgetId][action]();
        }
        return;
      }
      for (var id in registry) {
        if (registry.hasOwnProperty(id) && typeof registry[id][action] === "function") {
          registry[id][action]();
        }
      }
    };
    dispatch.dispatcherInstalled = true;
    window.collecty = dispatch;
    var queued = (existing && existing.q) || [];
    for (var i = 0; i < queued.length; i++) {
      try { dispatch.apply(null, queued[i]); } catch (err) { /* queued call failed */ }
    }
  }
"#;

/// Best-effort geolocation lookup shared by both scripts. Resolves to null
/// after the timer or on any failure; never rejects.
pub(crate) const GEO_JS: &str = r#"  function lookupGeo() {
    var timer = new Promise(function (resolve) {
      window.setTimeout(function () { resolve(null); }, 1200);
    });
    var lookup = window.fetch("https://ipapi.co/json/")
      .then(function (response) { return response.ok ? response.json() : null; })
      .catch(function () { return null; });
    return Promise.race([lookup, timer]).catch(function () { return null; });
  }

  function buildMetadata(geo) {
    var metadata = {
      userAgent: navigator.userAgent,
      referrer: document.referrer,
      pageUrl: window.location.href,
      source: SOURCE
    };
    if (geo) {
      if (geo.country_name) { metadata.country = geo.country_name; }
      if (geo.region) { metadata.region = geo.region; }
      if (geo.city) { metadata.city = geo.city; }
    }
    return metadata;
  }
"#;
