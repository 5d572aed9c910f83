//! Coarse User-Agent classification for subscriber metadata.
//!
//! The dashboard only ever charts three device buckets and a handful of
//! browser/OS names, so a substring matcher is enough. Match order matters:
//! Edge and Opera advertise Chrome, Chrome advertises Safari, and iPads
//! claim to be Macs.

/// Classification result; values land in the server half of subscriber
/// metadata verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub device: &'static str,
    pub browser: &'static str,
    pub os: &'static str,
}

/// Classify a raw User-Agent header value.
pub fn parse_user_agent(raw: &str) -> ParsedUserAgent {
    let ua = raw.trim().to_ascii_lowercase();
    if ua.is_empty() {
        return ParsedUserAgent {
            device: "unknown",
            browser: "unknown",
            os: "unknown",
        };
    }

    ParsedUserAgent {
        device: classify_device(&ua),
        browser: classify_browser(&ua),
        os: classify_os(&ua),
    }
}

fn classify_device(ua: &str) -> &'static str {
    if ua.contains("ipad") || ua.contains("tablet") || (ua.contains("android") && !ua.contains("mobile")) {
        "tablet"
    } else if ua.contains("mobi") || ua.contains("iphone") || ua.contains("ipod") {
        "mobile"
    } else {
        "desktop"
    }
}

fn classify_browser(ua: &str) -> &'static str {
    if ua.contains("edg/") || ua.contains("edge/") || ua.contains("edgios/") {
        "Edge"
    } else if ua.contains("opr/") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("firefox/") || ua.contains("fxios/") {
        "Firefox"
    } else if ua.contains("chrome/") || ua.contains("crios/") {
        "Chrome"
    } else if ua.contains("safari/") {
        "Safari"
    } else if ua.contains("msie") || ua.contains("trident/") {
        "IE"
    } else {
        "unknown"
    }
}

fn classify_os(ua: &str) -> &'static str {
    if ua.contains("windows") {
        "Windows"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
        "iOS"
    } else if ua.contains("mac os x") || ua.contains("macintosh") {
        "macOS"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("cros") {
        "ChromeOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        "unknown"
    }
}
