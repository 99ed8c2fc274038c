use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::RawEntry;

static IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img[^>]+src="([^">]+)""#).expect("valid img regex"));

/// Best guess at an image for an entry, without touching the network.
///
/// Looks at, in order: media thumbnails, image media content, image-typed
/// links, and finally the first `<img>` tag embedded in the summary.
pub fn extract_thumbnail(entry: &RawEntry) -> Option<String> {
    if let Some(url) = entry.media_thumbnail.iter().find_map(|t| t.url.clone()) {
        return Some(url);
    }

    if let Some(url) = entry
        .media_content
        .iter()
        .filter(|c| c.medium.as_deref() == Some("image"))
        .find_map(|c| c.url.clone())
    {
        return Some(url);
    }

    if let Some(link) = entry.links.iter().find(|l| {
        l.mime_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image"))
    }) {
        return link.href.clone();
    }

    entry
        .summary
        .as_deref()
        .and_then(|html| IMG_SRC.captures(html))
        .map(|caps| caps[1].to_string())
}
