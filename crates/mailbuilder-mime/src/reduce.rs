//! HTML to plain text reduction.
//!
//! A best-effort syntactic pass, not an HTML parser. The steps run in a
//! fixed order and later steps rely on the normalization done by earlier
//! ones:
//!
//! 1. drop every `\r` and `\n`
//! 2. `<br>` becomes a newline
//! 3. heading tags (`<h1>` to `<h6>`, opening or closing) become newlines
//! 4. paragraph tags become newlines
//! 5. `<div>` tags become newlines
//! 6. if there is a `<body>` ... `</body>` pair, keep only what is inside
//! 7. `<script>` and `<noscript>` blocks are removed with their content
//! 8. `<li>` becomes `"\n- "`
//! 9. `</ul>` and `</ol>` become newlines
//! 10. every remaining tag is removed
//! 11. three or more newlines collapse to two
//! 12. leading and trailing whitespace is trimmed

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("reducer patterns are valid")
}

static BREAK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<br\b[^>]*>"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)</?h[1-6]\b[^>]*>"));
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)</?p\b[^>]*>"));
static DIV: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)</?div\b[^>]*>"));
static BODY: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<body\b[^>]*>(.*)</body\s*>"));
static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<script\b[^>]*>.*?</script\s*>"));
static NOSCRIPT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<li\b[^>]*>"));
static LIST_END: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)</(?:ul|ol)\s*>"));
static TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"<[^>]+>"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| pattern(r"\n{3,}"));

/// Converts HTML documents to plain text for the text alternative of a
/// message.
pub trait HtmlToPlain: Send + Sync {
    /// Converts the given HTML text to plain text.
    fn convert(&self, html: &str) -> String;
}

/// The built-in converter, applying [`html_to_plain`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleHtmlToPlain;

impl HtmlToPlain for SimpleHtmlToPlain {
    fn convert(&self, html: &str) -> String {
        html_to_plain(html)
    }
}

impl<F> HtmlToPlain for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn convert(&self, html: &str) -> String {
        self(html)
    }
}

/// Reduces optional HTML to plain text. `None` passes through.
#[must_use]
pub fn reduce(html: Option<&str>) -> Option<String> {
    html.map(html_to_plain)
}

/// Reduces an HTML document to readable plain text.
#[must_use]
pub fn html_to_plain(html: &str) -> String {
    let text = html.replace(['\r', '\n'], "");

    let text = BREAK.replace_all(&text, "\n");
    let text = HEADING.replace_all(&text, "\n");
    let text = PARAGRAPH.replace_all(&text, "\n");
    let text = DIV.replace_all(&text, "\n");

    let text = match BODY.captures(&text) {
        Some(caps) => caps.get(1).map_or("", |inner| inner.as_str()).to_string(),
        None => text.into_owned(),
    };

    let text = SCRIPT.replace_all(&text, "");
    let text = NOSCRIPT.replace_all(&text, "");

    let text = LIST_ITEM.replace_all(&text, "\n- ");
    let text = LIST_END.replace_all(&text, "\n");

    let text = TAG.replace_all(&text, "");
    let text = BLANK_LINES.replace_all(&text, "\n\n");

    text.trim().to_string()
}
