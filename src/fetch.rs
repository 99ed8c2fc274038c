use feed_rs::model::Entry;
use feed_rs::parser;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::{Captures, Regex};
use reqwest::blocking::Client;
use std::borrow::Cow;
use std::time::Duration;
use tracing::debug;

use crate::aggregate::{FeedFetcher, FetchedFeed};
use crate::error::{EntryError, SourceError};
use crate::model::{EntryLink, MediaContent, MediaThumbnail, RawEntry};

static AMPERSAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]*;|#[0-9]+;|#[xX][0-9A-Fa-f]+;)?")
        .expect("valid ampersand regex")
});

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".avif"];

/// Fetches feeds over HTTP and parses them with `feed-rs`.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedFeed, SourceError> {
        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status()));
        }

        let bytes = resp.bytes()?;
        parse_feed_bytes(&bytes)
    }
}

/// Parse a feed document, retrying once on a repaired copy when the strict
/// parse fails. A feed that only parses after repair is flagged malformed.
pub fn parse_feed_bytes(bytes: &[u8]) -> Result<FetchedFeed, SourceError> {
    let text = String::from_utf8_lossy(bytes);

    let (feed, document, malformed) = match parser::parse(bytes) {
        Ok(feed) => (feed, text.into_owned(), None),
        Err(strict_err) => {
            debug!(error = %strict_err, "strict parse failed; retrying on repaired document");
            let repaired = repair_document(&text);
            let feed = parser::parse(repaired.as_bytes())
                .map_err(|_| SourceError::Parse(strict_err.to_string()))?;
            (feed, repaired, Some(strict_err.to_string()))
        }
    };

    // feed-rs only hands back parsed timestamps; the snapshot wants the text
    let mut raw_dates = collect_raw_dates(&document);
    if raw_dates.len() != feed.entries.len() {
        debug!(
            entries = feed.entries.len(),
            dated = raw_dates.len(),
            "raw dates don't line up with entries; using parsed timestamps"
        );
        raw_dates.clear();
    }

    let entries = feed
        .entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| raw_entry_from(entry, raw_dates.get(idx)))
        .collect();

    Ok(FetchedFeed { entries, malformed })
}

/// Date text of one `<item>`/`<entry>`, exactly as written in the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDates {
    pub published: Option<String>,
    pub updated: Option<String>,
}

#[derive(Clone, Copy)]
enum DateField {
    Published,
    Updated,
}

fn date_field(local_name: &[u8]) -> Option<DateField> {
    match local_name {
        b"pubDate" | b"published" | b"issued" => Some(DateField::Published),
        b"updated" | b"modified" | b"date" => Some(DateField::Updated),
        _ => None,
    }
}

/// One [`RawDates`] per item/entry, in document order. Stops quietly at the
/// first XML error; the caller checks the count against the parsed entries.
pub fn collect_raw_dates(document: &str) -> Vec<RawDates> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut dates = Vec::new();
    let mut current: Option<RawDates> = None;
    let mut field: Option<DateField> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"item" | b"entry" => current = Some(RawDates::default()),
                    other if current.is_some() => {
                        field = date_field(other);
                        text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::CData(e)) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"item" | b"entry" => {
                        if let Some(done) = current.take() {
                            dates.push(done);
                        }
                        field = None;
                    }
                    _ => {
                        if let (Some(f), Some(record)) = (field.take(), current.as_mut()) {
                            let value = text.trim();
                            let slot = match f {
                                DateField::Published => &mut record.published,
                                DateField::Updated => &mut record.updated,
                            };
                            if slot.is_none() && !value.is_empty() {
                                *slot = Some(value.to_string());
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                debug!(error = %err, "stopped scanning for raw dates");
                break;
            }
            _ => {}
        }
    }

    dates
}

/// Drop anything before the first tag and escape bare ampersands.
pub fn repair_document(text: &str) -> String {
    let start = text.find('<').unwrap_or(text.len());
    let body = &text[start..];

    AMPERSAND
        .replace_all(body, |caps: &Captures| -> Cow<'static, str> {
            if caps[0].len() == 1 {
                Cow::Borrowed("&amp;")
            } else {
                Cow::Owned(caps[0].to_string())
            }
        })
        .into_owned()
}

/// Flatten a `feed-rs` entry into the fields the pipeline cares about.
///
/// Dates come from `raw_dates` when the document text was recovered, and
/// from feed-rs's parsed timestamps otherwise.
pub fn raw_entry_from(entry: Entry, raw_dates: Option<&RawDates>) -> Result<RawEntry, EntryError> {
    let title = entry.title.as_ref().map(|t| t.content.clone());
    let link = select_entry_link(&entry);

    let summary = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .or_else(|| {
            entry
                .media
                .iter()
                .find_map(|m| m.description.as_ref().map(|d| d.content.clone()))
        })
        .filter(|s| !s.trim().is_empty());

    if title.is_none() && link.is_none() && summary.is_none() {
        return Err(EntryError::Empty);
    }

    let media_thumbnail = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| MediaThumbnail {
            url: Some(t.image.uri.clone()).filter(|u| !u.is_empty()),
        })
        .collect();

    let media_content = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .map(|c| {
            let url = c.url.as_ref().map(|u| u.to_string());
            let medium = c
                .content_type
                .as_ref()
                .and_then(|m| m.to_string().split('/').next().map(str::to_string))
                .or_else(|| {
                    url.as_deref()
                        .filter(|u| looks_like_image(u))
                        .map(|_| "image".to_string())
                });
            MediaContent { url, medium }
        })
        .collect();

    let links = entry
        .links
        .iter()
        .map(|l| EntryLink {
            href: Some(l.href.clone()),
            mime_type: l.media_type.clone(),
        })
        .collect();

    Ok(RawEntry {
        title,
        link,
        summary,
        published: raw_dates
            .and_then(|d| d.published.clone())
            .or_else(|| entry.published.map(|d| d.to_rfc3339())),
        updated: raw_dates
            .and_then(|d| d.updated.clone())
            .or_else(|| entry.updated.map(|d| d.to_rfc3339())),
        media_thumbnail,
        media_content,
        links,
    })
}

fn select_entry_link(entry: &Entry) -> Option<String> {
    let alternate = entry.links.iter().find(|l| {
        let rel = l.rel.as_deref().unwrap_or("");
        !l.href.trim().is_empty() && (rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
    });
    if let Some(link) = alternate.or_else(|| entry.links.iter().find(|l| !l.href.trim().is_empty()))
    {
        return Some(link.href.clone());
    }

    let id = entry.id.trim();
    (id.starts_with("http://") || id.starts_with("https://")).then(|| id.to_string())
}

fn looks_like_image(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
