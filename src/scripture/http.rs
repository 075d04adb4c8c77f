//! [ScriptureSource] over HTTP.
//!
//! Reference lookups and the daily verse come from a bible-api.com style
//! endpoint, free-text search comes from a bolls.life style endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::{book_name, LookupError, ScriptureSource, VerseResult};
use crate::setup::ScriptureConfig;

/// Talks to the configured verse APIs. The inner [Client] is an `Arc`.
#[derive(Debug, Clone)]
pub struct HttpScripture {
    client: Client,
    bible_api: Url,
    search_api: Url,
    translation: String,
    search_translation: String,
}

impl HttpScripture {
    pub fn new(config: &ScriptureConfig, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            bible_api: Url::parse(&config.bible_api_url)?,
            search_api: Url::parse(&config.search_api_url)?,
            translation: config.translation.clone(),
            search_translation: config.search_translation.clone(),
        })
    }

    /// `{base}/{segments..}`, keeping whatever path the base already has.
    fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, LookupError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<String, LookupError> {
        tracing::debug!("GET {url}");
        let response = self.client.get(url).send().await.map_err(from_reqwest)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(LookupError::NotFound),
            status if !status.is_success() => Err(LookupError::Status(status)),
            _ => response.text().await.map_err(from_reqwest),
        }
    }
}

#[async_trait]
impl ScriptureSource for HttpScripture {
    #[instrument(skip(self))]
    async fn lookup(&self, reference: &str) -> Result<VerseResult, LookupError> {
        let mut url = Self::endpoint(&self.bible_api, &[reference.trim()])?;
        url.query_pairs_mut()
            .append_pair("translation", &self.translation);

        let body = self.get(url).await?;
        parse_passage(&body)
    }

    #[instrument(skip(self))]
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<VerseResult>, LookupError> {
        let mut url = Self::endpoint(&self.search_api, &["v2", "find", &self.search_translation])?;
        url.query_pairs_mut()
            .append_pair("search", term.trim())
            .append_pair("match_case", "false")
            .append_pair("match_whole", "false")
            .append_pair("limit", &limit.to_string());

        let body = self.get(url).await?;
        parse_search(&body, &self.search_translation, limit)
    }

    #[instrument(skip(self))]
    async fn daily(&self) -> Result<VerseResult, LookupError> {
        let mut url = Self::endpoint(&self.bible_api, &[])?;
        url.query_pairs_mut()
            .append_pair("random", "verse")
            .append_pair("translation", &self.translation);

        let body = self.get(url).await?;
        parse_passage(&body)
    }
}

fn from_reqwest(error: reqwest::Error) -> LookupError {
    if error.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Http(error)
    }
}

#[derive(Deserialize)]
struct Passage {
    reference: String,
    verses: Vec<PassageVerse>,
    text: String,
    translation_name: String,
}

#[derive(Deserialize)]
struct PassageVerse {
    book_name: String,
    chapter: u32,
    verse: u32,
}

#[derive(Deserialize)]
struct SearchPage {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    book: u32,
    chapter: u32,
    verse: u32,
    text: String,
}

/// Parse a bible-api.com passage. The first verse locates the passage.
fn parse_passage(body: &str) -> Result<VerseResult, LookupError> {
    let passage: Passage = serde_json::from_str(body)?;
    let first = passage.verses.first().ok_or(LookupError::NotFound)?;

    let text = collapse_whitespace(&passage.text);
    if text.is_empty() {
        return Err(LookupError::NotFound);
    }

    Ok(VerseResult {
        reference: passage.reference,
        book: first.book_name.clone(),
        chapter: first.chapter,
        verse: first.verse,
        text,
        translation: passage.translation_name,
    })
}

/// Parse a bolls.life search page, keeping at most `limit` hits.
fn parse_search(
    body: &str,
    translation: &str,
    limit: usize,
) -> Result<Vec<VerseResult>, LookupError> {
    let page: SearchPage = serde_json::from_str(body)?;

    let verses: Vec<VerseResult> = page
        .results
        .into_iter()
        .take(limit)
        .map(|hit| {
            let book = book_name(hit.book)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Book {}", hit.book));
            VerseResult {
                reference: format!("{book} {}:{}", hit.chapter, hit.verse),
                book,
                chapter: hit.chapter,
                verse: hit.verse,
                text: collapse_whitespace(&strip_markup(&hit.text)),
                translation: translation.to_string(),
            }
        })
        .collect();

    if verses.is_empty() {
        Err(LookupError::NotFound)
    } else {
        Ok(verses)
    }
}

/// Drop HTML tags, and the contents of Strong's number (`<S>`) and footnote (`<sup>`) tags.
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('>') else {
            // Unclosed tag, keep it as text.
            out.push_str(&rest[start..]);
            return out;
        };
        let tag = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];

        let skip_until = match tag.to_ascii_lowercase().as_str() {
            "s" => Some("</s>"),
            "sup" => Some("</sup>"),
            _ => None,
        };
        if let Some(close) = skip_until {
            // ASCII lowercasing keeps byte offsets.
            rest = match rest.to_ascii_lowercase().find(close) {
                Some(end) => &rest[end + close.len()..],
                None => "",
            };
        }
    }

    out.push_str(rest);
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
