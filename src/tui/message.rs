use chrono::{Local, TimeZone};

use crate::chat::{AttachmentFile, Sender};

/// Label shown in front of a message
pub fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "You",
        Sender::Assistant => "Assistant",
    }
}

/// Format an epoch-millisecond timestamp as local `HH:MM`
pub fn format_time(timestamp: i64) -> String {
    match Local.timestamp_millis_opt(timestamp).single() {
        Some(time) => time.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Comma-separated attachment names
pub fn attachment_summary(attachments: &[AttachmentFile]) -> String {
    attachments
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
