//! Plain text to display HTML.
//!
//! The text is HTML-escaped, line breaks become `<br>`, runs of spaces are
//! preserved with `&nbsp;`, and `http(s)` URLs and e-mail addresses are
//! turned into links. The result is wrapped in a monospace container.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RenderConfig;

/// URLs and e-mail addresses, matched in one pass over the escaped text.
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?P<url>https?://[^\s<>"]+)|(?P<email>[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})"#,
    )
    .expect("link pattern is valid")
});

/// Entities that may end up glued to a URL after escaping.
const TRAILING_ENTITIES: [&str; 4] = ["&gt;", "&lt;", "&quot;", "&#39;"];

/// Convert `text` with default render settings.
pub fn text_to_html(text: &str) -> String {
    text_to_html_with(text, &RenderConfig::default())
}

/// Convert `text` into a displayable HTML fragment. Empty text gives an
/// empty string.
pub fn text_to_html_with(text: &str, config: &RenderConfig) -> String {
    if text.is_empty() {
        return String::new();
    }

    let escaped = escape_html(text);
    let broken = line_breaks(&escaped);
    let spaced = preserve_spaces(&broken);
    let linked = linkify(&spaced, config.link_target_blank);

    format!("<div style=\"{}\">{}</div>", config.container_style, linked)
}

/// Escape `& < > " '`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `\r\n`, lone `\n` and lone `\r` each become one `<br>`.
fn line_breaks(text: &str) -> String {
    text.replace("\r\n", "<br>")
        .replace('\n', "<br>")
        .replace('\r', "<br>")
}

/// A run of n spaces becomes one space followed by n-1 `&nbsp;`.
fn preserve_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;
    for c in text.chars() {
        if c == ' ' {
            if run == 0 {
                out.push(' ');
            } else {
                out.push_str("&nbsp;");
            }
            run += 1;
        } else {
            run = 0;
            out.push(c);
        }
    }
    out
}

fn linkify(escaped: &str, target_blank: bool) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut last = 0;

    for caps in LINK_RE.captures_iter(escaped) {
        if let Some(m) = caps.name("url") {
            let url = trim_url_tail(m.as_str());
            out.push_str(&escaped[last..m.start()]);
            push_anchor(&mut out, url, url, target_blank);
            last = m.start() + url.len();
        } else if let Some(m) = caps.name("email") {
            out.push_str(&escaped[last..m.start()]);
            out.push_str(&format!("<a href=\"mailto:{0}\">{0}</a>", m.as_str()));
            last = m.end();
        }
    }
    out.push_str(&escaped[last..]);
    out
}

fn push_anchor(out: &mut String, href: &str, label: &str, target_blank: bool) {
    if target_blank {
        out.push_str(&format!(
            "<a href=\"{href}\" target=\"_blank\" rel=\"noopener noreferrer\">{label}</a>"
        ));
    } else {
        out.push_str(&format!("<a href=\"{href}\">{label}</a>"));
    }
}

/// Drop text glued to the end of a matched URL that belongs to the
/// sentence: escaped `< > " '` and closing punctuation. A `)` stays when
/// it closes a `(` inside the URL.
fn trim_url_tail(matched: &str) -> &str {
    let mut url = matched;
    loop {
        let before = url.len();
        for entity in TRAILING_ENTITIES {
            if let Some(stripped) = url.strip_suffix(entity) {
                url = stripped;
            }
        }
        url = url.trim_end_matches(['.', ',', '!', '?', ':']);
        if url.ends_with(')') && url.matches(')').count() > url.matches('(').count() {
            url = &url[..url.len() - 1];
        }
        if url.len() == before {
            return url;
        }
    }
}
