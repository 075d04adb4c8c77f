use std::sync::Arc;
use std::time::Duration;

use serenity::ChannelId;
use tracing::instrument;

use super::reply::{Field, Reply, FIELD_VALUE_MAX, SUCCESS};
use super::{Actor, Response};
use crate::data::Data;
use crate::error::UserError;
use crate::gateway::Gateway;
use crate::lib::{format_duration, truncate};
use crate::serenity;

pub const MIN_MINUTES: u32 = 1;
/// One day.
pub const MAX_MINUTES: u32 = 1440;
/// Keeps the follow-up well under Discord's message limit.
pub const MAX_MESSAGE_CHARS: u32 = 1000;

/// The follow-up posted once the reminder fires.
pub fn reminder_text(actor: &Actor, message: &str) -> String {
    format!("{} ⏰ Reminder: {message}", actor.mention())
}

/// Acknowledge now and post `message` in `channel` after `minutes`.
#[instrument(skip(data, gateway, actor, message))]
pub async fn remind(
    data: &Data,
    gateway: Arc<dyn Gateway>,
    channel: ChannelId,
    actor: &Actor,
    minutes: u32,
    message: String,
) -> Result<Response, UserError> {
    if !(MIN_MINUTES..=MAX_MINUTES).contains(&minutes) {
        return Err(UserError::Validation {
            argument: "minutes",
            min: MIN_MINUTES,
            max: MAX_MINUTES,
            given: minutes,
        });
    }
    let length = u32::try_from(message.chars().count()).unwrap_or(u32::MAX);
    if !(1..=MAX_MESSAGE_CHARS).contains(&length) {
        return Err(UserError::Validation {
            argument: "message",
            min: 1,
            max: MAX_MESSAGE_CHARS,
            given: length,
        });
    }

    let delay = Duration::from_secs(u64::from(minutes) * 60);
    let text = reminder_text(actor, &message);
    let timeout = data.request_timeout;

    let delivery = async move {
        match tokio::time::timeout(timeout, gateway.send(channel, &text)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("Couldn't deliver reminder in {channel}: {e}"),
            Err(_) => tracing::error!("Delivering reminder in {channel} timed out"),
        }
    };
    let reminder = data.reminders.schedule(delay, delivery).await;

    let ack = Reply::builder()
        .title("Reminder set")
        .color(SUCCESS)
        .description(format!("I'll remind you in {}.", format_duration(&delay)))
        .fields(vec![Field::new(
            "Message",
            truncate(&message, FIELD_VALUE_MAX),
            false,
        )])
        .footer(format!("Reminder {reminder}"))
        .ephemeral(true)
        .build();

    Ok(Response::Scheduled { ack, reminder })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gateway::mock::{Call, MockGateway};
    use crate::router::test_support::*;
    use crate::router::Command;

    fn remind_cmd(minutes: u32) -> Command {
        Command::Remind {
            minutes,
            message: "X".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_after_a_minute_without_blocking() {
        let data = data();
        let gateway = MockGateway::new();
        let invoker = member();

        let response = run(&data, &gateway, invoker.clone(), remind_cmd(1))
            .await
            .unwrap();
        assert!(matches!(response, Response::Scheduled { .. }));
        assert_eq!(data.reminders.pending().await, 1);

        // Other commands still answer right away.
        tokio::time::sleep(Duration::from_secs(1)).await;
        let start = tokio::time::Instant::now();
        let ping = Command::Ping {
            latency: Duration::from_millis(30),
        };
        run(&data, &gateway, invoker.clone(), ping).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(gateway.calls().is_empty());

        tokio::time::sleep(Duration::from_secs(58)).await;
        assert!(gateway.calls().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(
            gateway.calls(),
            vec![Call::Send(CHANNEL, reminder_text(&invoker, "X"))]
        );
        assert_eq!(data.reminders.pending().await, 0);
    }

    #[tokio::test]
    async fn delay_must_be_in_range() {
        let data = data();
        let gateway = MockGateway::new();

        for minutes in [0, 1441] {
            let result = run(&data, &gateway, member(), remind_cmd(minutes)).await;
            assert!(matches!(result, Err(UserError::Validation { .. })));
        }
        assert_eq!(data.reminders.pending().await, 0);
    }

    #[tokio::test]
    async fn message_must_fit() {
        let data = data();
        let gateway = MockGateway::new();

        for message in [String::new(), "x".repeat(3000)] {
            let command = Command::Remind { minutes: 5, message };
            let result = run(&data, &gateway, member(), command).await;
            assert!(matches!(
                result,
                Err(UserError::Validation {
                    argument: "message",
                    ..
                })
            ));
        }
        assert_eq!(data.reminders.pending().await, 0);
    }

    #[tokio::test]
    async fn longest_message_is_acknowledged_in_full() {
        let data = data();
        let gateway = MockGateway::new();
        let message = "x".repeat(MAX_MESSAGE_CHARS as usize);

        let command = Command::Remind {
            minutes: 5,
            message: message.clone(),
        };
        let response = run(&data, &gateway, member(), command).await.unwrap();
        assert_eq!(response.reply().fields[0].value, message);
        assert_eq!(data.reminders.pending().await, 1);
    }

    #[test]
    fn follow_up_mentions_the_requester() {
        let text = reminder_text(&member(), "pray");
        assert_eq!(text, "<@20> ⏰ Reminder: pray");
    }
}
