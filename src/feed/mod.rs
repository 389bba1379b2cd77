//! Message feed collaborators
//!
//! This module handles:
//! - The `MessageFeed` / `ReplySink` seams the pipeline talks to
//! - A TCP client for the development feed server

mod tcp;
mod traits;

pub use tcp::{TcpFeed, TcpFeedConfig};
pub use traits::{FeedError, FeedFilter, FeedStream, InboundMessage, MessageFeed, ReplySink};
