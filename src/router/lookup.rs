//! Verse lookup, search and the daily verse.
//!
//! Failures never reach the user as errors, they become a "Not found" reply.

use std::future::Future;

use tracing::instrument;

use super::reply::{Field, Reply, DESCRIPTION_MAX, NOT_FOUND, SCRIPTURE};
use crate::data::Data;
use crate::lib::truncate;
use crate::scripture::{LookupError, VerseResult};

/// Most verses shown for one search.
pub const SEARCH_LIMIT: usize = 5;
/// Characters of verse text shown per search result.
pub const SNIPPET_CHARS: usize = 180;
/// Characters of a user's query echoed back in titles and descriptions.
const QUERY_CHARS: usize = 200;

/// Run a lookup under the request timeout.
async fn bounded<T>(
    data: &Data,
    call: impl Future<Output = Result<T, LookupError>>,
) -> Result<T, LookupError> {
    tokio::time::timeout(data.request_timeout, call)
        .await
        .unwrap_or(Err(LookupError::Timeout))
}

fn not_found(query: &str, error: &LookupError) -> Reply {
    match error {
        LookupError::NotFound => tracing::debug!("No verses for '{query}'"),
        _ => tracing::warn!("Lookup for '{query}' failed: {error}"),
    }

    Reply::builder()
        .title("Not found")
        .color(NOT_FOUND)
        .description(format!(
            "Couldn't find anything for `{}`.",
            truncate(query, QUERY_CHARS)
        ))
        .ephemeral(true)
        .build()
}

/// Whole chapters can run past what one embed holds.
fn verse_reply(verse: VerseResult) -> Reply {
    Reply::builder()
        .title(verse.reference)
        .color(SCRIPTURE)
        .description(truncate(&verse.text, DESCRIPTION_MAX))
        .footer(verse.translation)
        .build()
}

fn results_title(term: &str) -> String {
    format!("Results for \"{}\"", truncate(term, QUERY_CHARS))
}

#[instrument(skip(data))]
pub async fn verse(data: &Data, reference: &str) -> Reply {
    match bounded(data, data.scripture.lookup(reference)).await {
        Ok(verse) => verse_reply(verse),
        Err(e) => not_found(reference, &e),
    }
}

#[instrument(skip(data))]
pub async fn search(data: &Data, term: &str) -> Reply {
    let verses = match bounded(data, data.scripture.search(term, SEARCH_LIMIT)).await {
        Ok(verses) if !verses.is_empty() => verses,
        Ok(_) => return not_found(term, &LookupError::NotFound),
        Err(e) => return not_found(term, &e),
    };

    let translation = verses[0].translation.clone();
    let fields = verses
        .into_iter()
        .take(SEARCH_LIMIT)
        .map(|verse| Field::new(verse.reference, truncate(&verse.text, SNIPPET_CHARS), false))
        .collect();

    Reply::builder()
        .title(results_title(term))
        .color(SCRIPTURE)
        .fields(fields)
        .footer(translation)
        .build()
}

#[instrument(skip(data))]
pub async fn daily(data: &Data) -> Reply {
    match bounded(data, data.scripture.daily()).await {
        Ok(verse) => {
            let mut reply = verse_reply(verse);
            reply.title = format!("Verse of the day: {}", reply.title);
            reply
        }
        Err(e) => not_found("the verse of the day", &e),
    }
}
