//! Feed trait abstraction for pluggable message sources

use anyhow::Result;
use async_trait::async_trait;
use feedbot_shared::{codec::CodecError, OriginatorId};
use futures::stream::BoxStream;
use thiserror::Error;

/// One message delivered by the feed
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Id of the message, replies are addressed to it
    pub id: OriginatorId,
    pub language: String,
    pub text: String,
}

/// Which messages the feed should deliver
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFilter {
    /// Accounts whose mentions are tracked (empty = everything)
    pub accounts: Vec<String>,
    /// Accepted language codes (empty = any)
    pub languages: Vec<String>,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            languages: vec!["en".into()],
        }
    }
}

/// Errors raised by a feed subscription
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed rejected credentials: {0}")]
    Unauthorized(String),

    #[error("could not reach feed at {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("feed handshake failed: {0}")]
    Handshake(String),

    #[error("feed protocol error: {0}")]
    Protocol(#[from] CodecError),

    #[error("feed closed the connection")]
    Closed,

    #[error("feed I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Credential failures are never retried
    pub fn is_auth(&self) -> bool {
        matches!(self, FeedError::Unauthorized(_))
    }
}

/// Live stream of inbound messages
pub type FeedStream = BoxStream<'static, Result<InboundMessage, FeedError>>;

/// A source of inbound messages
#[async_trait]
pub trait MessageFeed: Send + Sync {
    /// Open a filtered live stream
    async fn subscribe(&self, filter: &FeedFilter) -> Result<FeedStream, FeedError>;

    /// Human-readable name for this feed
    fn name(&self) -> &'static str;
}

/// Posts feedback replies to message originators
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Fire-and-forget; callers log failures and move on
    async fn post_reply(&self, text: &str, in_reply_to: &OriginatorId) -> Result<()>;
}
