use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid script regex"));
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid style regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid space regex"));

pub const DEFAULT_MIN_LEN: usize = 10;

/// Turn an HTML description into a single line of plain text.
///
/// Script and style blocks go first, contents included; otherwise their
/// bodies would survive tag stripping as visible text.
pub fn clean_description(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = SCRIPT_BLOCK.replace_all(html, "");
    let text = STYLE_BLOCK.replace_all(&text, "");
    let text = TAG.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Description cleaner with an optional fallback for empty or very short text
#[derive(Debug, Clone)]
pub struct TextSanitizer {
    pub fallback: Option<String>,
    pub min_len: usize,
}

impl Default for TextSanitizer {
    fn default() -> Self {
        Self {
            fallback: None,
            min_len: DEFAULT_MIN_LEN,
        }
    }
}

impl TextSanitizer {
    pub fn new(fallback: Option<String>, min_len: usize) -> Self {
        Self { fallback, min_len }
    }

    pub fn clean(&self, html: Option<&str>) -> String {
        let cleaned = clean_description(html.unwrap_or_default());

        match &self.fallback {
            Some(fallback) if cleaned.chars().count() < self.min_len => fallback.clone(),
            _ => cleaned,
        }
    }
}
