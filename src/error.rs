//! Error types.
//!
//! [UserError]s are expected failures that are shown to the invoking user.
//! Everything else is wrapped in [LampstandError] and treated as a bug.

use std::time::Duration;

use thiserror::Error;

use crate::router::ModAction;
use crate::serenity;

/// The error type returned by every command.
#[derive(Error, Debug)]
pub enum LampstandError {
    /// An error caused by the user, shown to them as an ephemeral reply.
    #[error(transparent)]
    UserError(#[from] UserError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("Command panicked: {}", payload.as_deref().unwrap_or("<no payload>"))]
    Panic { payload: Option<String> },

    #[error("Command structure mismatch: {description}")]
    CommandStructureMismatch { description: String },

    /// Invocation of a command this bot doesn't register. Never shown to users.
    #[error("Unknown command: '{name}'")]
    UnknownCommand { name: String },
}

/// Errors that are the user's to fix (or at least not the bot's fault).
#[derive(Error, Debug)]
pub enum UserError {
    #[error("You need the `{missing}` permission to do that.")]
    PermissionDenied { missing: serenity::Permissions },

    #[error("You can't {action} yourself.")]
    SelfTarget { action: ModAction },

    #[error("Can't do that to {target}: {reason}.")]
    NotActionable { target: String, reason: String },

    #[error("`{argument}` must be between {min} and {max} (got {given}).")]
    Validation {
        argument: &'static str,
        min: u32,
        max: u32,
        given: u32,
    },

    #[error("Couldn't {action}. Discord rejected the request, check my role and permissions.")]
    ActionFailed { action: String },

    #[error("This command only works in a server.")]
    GuildOnly,

    #[error("Couldn't understand the arguments{}.", input.as_ref().map(|i| format!(" '{i}'")).unwrap_or_default())]
    BadArgs { input: Option<String> },

    #[error("Slow down! Try again in {} seconds.", remaining_cooldown.as_secs().max(1))]
    OnCooldown { remaining_cooldown: Duration },

    #[error("Pick one of: {subcmds}.")]
    MissingSubcommand { subcmds: String },
}

/// Errors while reading `config.toml`. All of them are fatal on startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config file found. {action_msg} Fill it in and restart.")]
    MissingConfig { action_msg: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Couldn't access config file: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_mistakes_read_well() {
        let cooldown = UserError::OnCooldown {
            remaining_cooldown: Duration::from_millis(300),
        };
        assert_eq!(cooldown.to_string(), "Slow down! Try again in 1 seconds.");

        let args = UserError::BadArgs {
            input: Some("abc".to_string()),
        };
        assert_eq!(args.to_string(), "Couldn't understand the arguments 'abc'.");
        assert_eq!(
            UserError::BadArgs { input: None }.to_string(),
            "Couldn't understand the arguments."
        );

        let subcmds = UserError::MissingSubcommand {
            subcmds: "server, user".to_string(),
        };
        assert_eq!(subcmds.to_string(), "Pick one of: server, user.");
    }

    #[test]
    fn user_errors_pass_through_unchanged() {
        let error = LampstandError::from(UserError::GuildOnly);
        assert_eq!(error.to_string(), "This command only works in a server.");
        assert!(matches!(error, LampstandError::UserError(UserError::GuildOnly)));
    }
}
