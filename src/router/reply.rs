//! Structured replies, independent of how they're sent.

use poise::CreateReply;
use serenity::{Colour, CreateEmbed, CreateEmbedFooter, CreateMessage};

use crate::lib::truncate;
use crate::serenity;

pub const SUCCESS: u32 = 0x2ecc71;
pub const INFO: u32 = 0x00ff00;
pub const SCRIPTURE: u32 = 0xc9a227;
pub const NOT_FOUND: u32 = 0xe74c3c;

/// Discord's embed limits, in characters.
pub const TITLE_MAX: usize = 256;
pub const DESCRIPTION_MAX: usize = 4096;
pub const FIELD_NAME_MAX: usize = 256;
pub const FIELD_VALUE_MAX: usize = 1024;
pub const FOOTER_MAX: usize = 2048;

/// One embed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

/// A reply to a command, rendered as a single embed.
///
/// Text longer than Discord allows is cut when the embed is built, so a reply
/// never fails to send because of its length.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
#[builder(on(String, into))]
pub struct Reply {
    pub title: String,
    pub color: u32,
    pub description: Option<String>,
    #[builder(default)]
    pub fields: Vec<Field>,
    pub footer: Option<String>,
    pub thumbnail: Option<String>,
    /// Only visible to the invoking user.
    #[builder(default)]
    pub ephemeral: bool,
}

impl Reply {
    pub fn embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .title(truncate(&self.title, TITLE_MAX))
            .colour(Colour::new(self.color))
            .fields(self.fields.iter().map(|f| {
                (
                    truncate(&f.name, FIELD_NAME_MAX),
                    truncate(&f.value, FIELD_VALUE_MAX),
                    f.inline,
                )
            }));

        if let Some(description) = &self.description {
            embed = embed.description(truncate(description, DESCRIPTION_MAX));
        }
        if let Some(footer) = &self.footer {
            embed = embed.footer(CreateEmbedFooter::new(truncate(footer, FOOTER_MAX)));
        }
        if let Some(url) = &self.thumbnail {
            embed = embed.thumbnail(url);
        }
        embed
    }
}

impl From<Reply> for CreateReply {
    fn from(reply: Reply) -> Self {
        CreateReply::default()
            .embed(reply.embed())
            .ephemeral(reply.ephemeral)
    }
}

impl From<Reply> for CreateMessage {
    fn from(reply: Reply) -> Self {
        CreateMessage::new().embed(reply.embed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_parts_default_to_empty() {
        let reply = Reply::builder().title("Pong!").color(INFO).build();

        assert_eq!(reply.description, None);
        assert!(reply.fields.is_empty());
        assert!(!reply.ephemeral);
    }

    #[test]
    fn oversized_text_still_builds_an_embed() {
        let reply = Reply::builder()
            .title("t".repeat(1000))
            .color(INFO)
            .description("d".repeat(10_000))
            .fields(vec![Field::new("n", "v".repeat(5000), false)])
            .build();

        // Serialized lengths are what Discord checks.
        let embed = serde_json::to_value(reply.embed()).unwrap();
        let len = |v: &serde_json::Value| v.as_str().unwrap().chars().count();
        assert_eq!(len(&embed["title"]), TITLE_MAX);
        assert_eq!(len(&embed["description"]), DESCRIPTION_MAX);
        assert_eq!(len(&embed["fields"][0]["value"]), FIELD_VALUE_MAX);
    }
}
