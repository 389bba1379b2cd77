//! Test doubles for the feed and actuator seams

use crate::actuator::Actuator;
use crate::feed::{FeedError, FeedFilter, FeedStream, InboundMessage, MessageFeed, ReplySink};
use anyhow::{bail, Result};
use async_trait::async_trait;
use feedbot_shared::{ActionParser, Command, OriginatorId, Validator};
use futures::StreamExt;
use std::sync::{Arc, Mutex};

/// Build a validated command, panicking on bad input
pub fn command(text: &str, id: &str) -> Command {
    let candidate = ActionParser::default().parse(text).unwrap();
    Validator::default()
        .validate(candidate, OriginatorId::new(id))
        .unwrap()
}

pub fn message(id: &str, text: &str) -> InboundMessage {
    InboundMessage {
        id: OriginatorId::new(id),
        language: "en".into(),
        text: text.into(),
    }
}

/// Shared, ordered log of replies and motions
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Feed that replays a fixed list of items
pub struct ScriptedFeed {
    items: Mutex<Option<Vec<Result<InboundMessage, FeedError>>>>,
    hold_open: bool,
}

impl ScriptedFeed {
    /// Stream ends after the last item
    pub fn new(items: Vec<Result<InboundMessage, FeedError>>) -> Self {
        Self {
            items: Mutex::new(Some(items)),
            hold_open: false,
        }
    }

    /// Stream stays open after the last item
    pub fn held_open(items: Vec<Result<InboundMessage, FeedError>>) -> Self {
        Self {
            items: Mutex::new(Some(items)),
            hold_open: true,
        }
    }
}

#[async_trait]
impl MessageFeed for ScriptedFeed {
    async fn subscribe(&self, _filter: &FeedFilter) -> Result<FeedStream, FeedError> {
        let items = self.items.lock().unwrap().take().unwrap_or_default();
        let stream = futures::stream::iter(items);
        if self.hold_open {
            Ok(stream.chain(futures::stream::pending()).boxed())
        } else {
            Ok(stream.boxed())
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Reply sink writing `reply <id>: <text>` into a journal
pub struct RecordingReplies {
    journal: Journal,
    fail: bool,
}

impl RecordingReplies {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail: false,
        }
    }

    /// Every post fails without recording
    pub fn failing(journal: Journal) -> Self {
        Self {
            journal,
            fail: true,
        }
    }
}

#[async_trait]
impl ReplySink for RecordingReplies {
    async fn post_reply(&self, text: &str, in_reply_to: &OriginatorId) -> Result<()> {
        if self.fail {
            bail!("reply channel down");
        }
        self.journal.push(format!("reply {}: {}", in_reply_to, text));
        Ok(())
    }
}

/// Actuator writing `move <d> <s>` / `rotate <deg> <s>` into a journal
pub struct RecordingActuator {
    journal: Journal,
    fail_rotations: bool,
}

impl RecordingActuator {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_rotations: false,
        }
    }

    /// Every rotation errors after being recorded
    pub fn failing_rotations(journal: Journal) -> Self {
        Self {
            journal,
            fail_rotations: true,
        }
    }
}

#[async_trait]
impl Actuator for RecordingActuator {
    fn name(&self) -> &str {
        "recording"
    }

    fn supports_motion(&self) -> bool {
        true
    }

    async fn move_by(&self, distance: f64, speed: f64) -> Result<()> {
        self.journal.push(format!("move {} {}", distance, speed));
        Ok(())
    }

    async fn rotate(&self, degrees: f64, speed: f64) -> Result<()> {
        if self.fail_rotations {
            self.journal
                .push(format!("rotate {} {} (failed)", degrees, speed));
            bail!("wheel stalled");
        }
        self.journal.push(format!("rotate {} {}", degrees, speed));
        Ok(())
    }
}
