//! Listener - turns feed messages into queued commands

use super::feedback;
use super::queue::{QueueError, QueueSender};
use super::shutdown::Shutdown;
use crate::feed::{FeedError, FeedFilter, InboundMessage, MessageFeed, ReplySink};
use feedbot_shared::{ActionParser, Command, CommandError, Validator};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Ingestion loop state
pub struct Listener {
    parser: ActionParser,
    validator: Validator,
    filter: FeedFilter,
    queue: QueueSender,
    replies: Arc<dyn ReplySink>,
}

impl Listener {
    pub fn new(
        parser: ActionParser,
        validator: Validator,
        filter: FeedFilter,
        queue: QueueSender,
        replies: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            parser,
            validator,
            filter,
            queue,
            replies,
        }
    }

    /// Consume the feed until it ends, fails, or shutdown is triggered.
    ///
    /// Only feed errors end the loop with `Err`; bad messages are answered and
    /// skipped. The queue sender is dropped on return, which lets the
    /// dispatcher finish what is already queued.
    pub async fn run(self, feed: &dyn MessageFeed, mut shutdown: Shutdown) -> Result<(), FeedError> {
        let mut stream = tokio::select! {
            biased;
            _ = shutdown.wait() => return Ok(()),
            stream = feed.subscribe(&self.filter) => stream?,
        };
        info!("[LISTENER] Listening on {} feed", feed.name());

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("[LISTENER] Shutdown requested");
                    return Ok(());
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(message)) => self.handle_message(message).await,
                Some(Err(e)) => {
                    if e.is_auth() {
                        error!("[LISTENER] Unauthorized feed credentials: {}", e);
                    } else {
                        error!("[LISTENER] Feed failed: {}", e);
                    }
                    return Err(e);
                }
                None => {
                    info!("[LISTENER] Feed ended");
                    return Ok(());
                }
            }
        }
    }

    /// Scan, parse and validate one message
    pub fn process(&self, message: &InboundMessage) -> Result<Command, CommandError> {
        let candidate = self.parser.parse(&message.text)?;
        self.validator.validate(candidate, message.id.clone())
    }

    async fn handle_message(&self, message: InboundMessage) {
        debug!(
            "[LISTENER] Message {} ({}): {}",
            message.id, message.language, message.text
        );

        let command = match self.process(&message) {
            Ok(command) => command,
            Err(CommandError::Invalid { readable }) => {
                info!("[LISTENER] Invalid command: {}", readable);
                feedback::send(&*self.replies, &feedback::invalid(&readable), &message.id).await;
                return;
            }
            Err(CommandError::Incomplete) => {
                debug!("[LISTENER] No action in message {}", message.id);
                feedback::send(&*self.replies, feedback::NO_VALID_ACTION, &message.id).await;
                return;
            }
        };

        let summary = format!(
            "{}, {}, {}",
            command.kind(),
            command.direction(),
            command.magnitude()
        );
        match self.queue.enqueue(command) {
            Ok(()) => info!(
                "[LISTENER] Added: {} (pending={})",
                summary,
                self.queue.pending()
            ),
            Err(QueueError::Full(command)) => {
                warn!("[LISTENER] Queue full, rejecting: {}", command.readable());
                feedback::send(
                    &*self.replies,
                    &feedback::queue_full(command.readable()),
                    command.originator(),
                )
                .await;
            }
            Err(QueueError::Closed(command)) => {
                error!(
                    "[LISTENER] Dispatcher stopped, dropping: {}",
                    command.readable()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::{dispatch_queue, QueuePolicy};
    use crate::pipeline::shutdown::shutdown_channel;
    use crate::testing::{message, Journal, RecordingReplies, ScriptedFeed};
    use feedbot_shared::{ActionKind, Direction};

    fn listener(queue: QueueSender, journal: &Journal) -> Listener {
        Listener::new(
            ActionParser::default(),
            Validator::default(),
            FeedFilter::default(),
            queue,
            Arc::new(RecordingReplies::new(journal.clone())),
        )
    }

    #[tokio::test]
    async fn test_process_stages() {
        let journal = Journal::default();
        let (tx, _rx) = dispatch_queue(QueuePolicy::Unbounded);
        let listener = listener(tx, &journal);

        let cmd = listener.process(&message("1", "@bot drive forward 40")).unwrap();
        assert_eq!(cmd.kind(), ActionKind::Drive);
        assert_eq!(cmd.direction(), Direction::Forward);
        assert_eq!(cmd.originator().as_str(), "1");

        assert_eq!(
            listener.process(&message("2", "hello world")),
            Err(CommandError::Incomplete)
        );
    }

    #[tokio::test]
    async fn test_run_enqueues_valid_and_replies_to_rest() {
        let journal = Journal::default();
        let (tx, mut rx) = dispatch_queue(QueuePolicy::Unbounded);
        let (_trigger, mut shutdown) = shutdown_channel();
        let feed = ScriptedFeed::new(vec![
            Ok(message("1", "drive forward 40")),
            Ok(message("2", "turn forward 90")),
            Ok(message("3", "hello world")),
            Ok(message("4", "turn left 90")),
        ]);

        listener(tx, &journal)
            .run(&feed, shutdown.clone())
            .await
            .unwrap();

        assert_eq!(
            journal.entries(),
            vec![
                "reply 2: Invalid action: turn forward 90".to_string(),
                format!("reply 3: {}", feedback::NO_VALID_ACTION),
            ]
        );
        assert_eq!(rx.dequeue(&mut shutdown).await.unwrap().readable(), "drive forward 40");
        assert_eq!(rx.dequeue(&mut shutdown).await.unwrap().readable(), "turn left 90");
        assert!(rx.dequeue(&mut shutdown).await.is_none());
    }

    #[tokio::test]
    async fn test_queue_full_reply() {
        let journal = Journal::default();
        let (tx, _rx) = dispatch_queue(QueuePolicy::Bounded { capacity: 1 });
        let (_trigger, shutdown) = shutdown_channel();
        let feed = ScriptedFeed::new(vec![
            Ok(message("1", "drive forward 1")),
            Ok(message("2", "drive forward 2")),
        ]);

        listener(tx, &journal).run(&feed, shutdown).await.unwrap();
        assert_eq!(
            journal.entries(),
            vec!["reply 2: Too many pending actions, try again later: drive forward 2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_auth_error_is_fatal() {
        let journal = Journal::default();
        let (tx, _rx) = dispatch_queue(QueuePolicy::Unbounded);
        let (_trigger, shutdown) = shutdown_channel();
        let feed = ScriptedFeed::new(vec![
            Ok(message("1", "drive forward 1")),
            Err(FeedError::Unauthorized("token revoked".into())),
            Ok(message("2", "drive forward 2")),
        ]);

        let err = listener(tx, &journal).run(&feed, shutdown).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_reply_failures_are_swallowed() {
        let journal = Journal::default();
        let (tx, _rx) = dispatch_queue(QueuePolicy::Unbounded);
        let (_trigger, shutdown) = shutdown_channel();
        let feed = ScriptedFeed::new(vec![Ok(message("1", "nothing here"))]);

        let listener = Listener::new(
            ActionParser::default(),
            Validator::default(),
            FeedFilter::default(),
            tx,
            Arc::new(RecordingReplies::failing(journal.clone())),
        );
        assert!(listener.run(&feed, shutdown).await.is_ok());
    }
}
