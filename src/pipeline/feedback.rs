//! Reply texts sent back to message originators

use crate::feed::ReplySink;
use feedbot_shared::OriginatorId;
use tracing::{debug, warn};

pub const NO_VALID_ACTION: &str =
    "No valid action received, must specify an action, direction, and value";

pub fn performing(readable: &str) -> String {
    format!("Performing action: {}", readable)
}

pub fn invalid(readable: &str) -> String {
    format!("Invalid action: {}", readable)
}

pub fn queue_full(readable: &str) -> String {
    format!("Too many pending actions, try again later: {}", readable)
}

/// Post a reply. Failures are logged and swallowed.
pub async fn send(replies: &dyn ReplySink, text: &str, in_reply_to: &OriginatorId) {
    match replies.post_reply(text, in_reply_to).await {
        Ok(()) => debug!("Replied to {}: {}", in_reply_to, text),
        Err(e) => warn!("Failed to reply to {}: {}", in_reply_to, e),
    }
}
