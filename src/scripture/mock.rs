//! Canned [ScriptureSource] for tests.

use std::time::Duration;

use async_trait::async_trait;

use super::{LookupError, ScriptureSource, VerseResult};

/// Knows a handful of verses, searches them by substring.
#[derive(Debug, Clone)]
pub struct MockScripture {
    verses: Vec<VerseResult>,
    /// Every call fails with a server error.
    broken: bool,
    /// Every call sleeps this long first.
    delay: Option<Duration>,
}

fn verse(book: &str, chapter: u32, verse: u32, text: &str) -> VerseResult {
    VerseResult {
        reference: format!("{book} {chapter}:{verse}"),
        book: book.to_string(),
        chapter,
        verse,
        text: text.to_string(),
        translation: "World English Bible".to_string(),
    }
}

impl MockScripture {
    pub fn new() -> Self {
        let mut verses = vec![
            verse(
                "John",
                3,
                16,
                "For God so loved the world, that he gave his one and only Son, \
                 that whoever believes in him should not perish, but have eternal life.",
            ),
            verse("Psalms", 23, 1, "Yahweh is my shepherd: I shall lack nothing."),
            verse("1 John", 4, 8, "He who doesn't love doesn't know God, for God is love."),
        ];
        // Longer than an embed description allows.
        verses.push(VerseResult {
            reference: "Psalms 119".to_string(),
            ..verse(
                "Psalms",
                119,
                1,
                &"Blessed are those whose ways are blameless, who walk according to Yahweh's law. "
                    .repeat(200),
            )
        });
        // Plenty of matches for "light".
        verses.extend((1..=7).map(|v| {
            verse(
                "Genesis",
                1,
                v,
                &format!("{v}: and there was light, {}", "and it was good. ".repeat(20)),
            )
        }));

        Self {
            verses,
            broken: false,
            delay: None,
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::new()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    async fn pre(&self) -> Result<(), LookupError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.broken {
            return Err(LookupError::Status(reqwest::StatusCode::BAD_GATEWAY));
        }
        Ok(())
    }
}

#[async_trait]
impl ScriptureSource for MockScripture {
    async fn lookup(&self, reference: &str) -> Result<VerseResult, LookupError> {
        self.pre().await?;
        self.verses
            .iter()
            .find(|v| v.reference.eq_ignore_ascii_case(reference.trim()))
            .cloned()
            .ok_or(LookupError::NotFound)
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<VerseResult>, LookupError> {
        self.pre().await?;
        let term = term.to_lowercase();
        let found: Vec<_> = self
            .verses
            .iter()
            .filter(|v| v.text.to_lowercase().contains(&term))
            .take(limit)
            .cloned()
            .collect();

        if found.is_empty() {
            Err(LookupError::NotFound)
        } else {
            Ok(found)
        }
    }

    async fn daily(&self) -> Result<VerseResult, LookupError> {
        self.pre().await?;
        self.verses.first().cloned().ok_or(LookupError::NotFound)
    }
}
