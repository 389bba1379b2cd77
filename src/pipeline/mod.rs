//! Command pipeline
//!
//! This module handles:
//! - Parsing and validating feed messages into commands (listener)
//! - Handing commands over in arrival order (dispatch queue)
//! - Driving the actuator one command at a time (dispatcher)
//! - Replying to message originators
//!
//! The listener and dispatcher run as two tasks that share nothing but the queue.

mod dispatcher;
mod feedback;
mod listener;
mod queue;
mod shutdown;

pub use queue::QueuePolicy;
pub use shutdown::ShutdownTrigger;

use dispatcher::Dispatcher;
use listener::Listener;
use queue::dispatch_queue;
use shutdown::shutdown_channel;

use crate::actuator::Actuator;
use crate::feed::{FeedError, FeedFilter, MessageFeed, ReplySink};
use anyhow::{anyhow, bail, Result};
use feedbot_shared::{ActionParser, Bounds, Validator, Vocabulary};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Settings consumed by the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub filter: FeedFilter,
    pub queue: QueuePolicy,
    pub vocabulary: Vocabulary,
    pub bounds: Bounds,
}

/// Entry point wiring listener, queue and dispatcher together
pub struct Pipeline;

impl Pipeline {
    /// Check the actuator and spawn both loops
    pub fn start(
        config: PipelineConfig,
        feed: Arc<dyn MessageFeed>,
        replies: Arc<dyn ReplySink>,
        actuator: Arc<dyn Actuator>,
    ) -> Result<PipelineHandle> {
        if !actuator.supports_motion() {
            bail!("{} cannot drive! try a different robot", actuator.name());
        }

        let (trigger, shutdown) = shutdown_channel();
        let (queue_tx, queue_rx) = dispatch_queue(config.queue);

        info!(
            "Starting pipeline: actuator={} queue={:?}",
            actuator.name(),
            config.queue
        );

        let dispatcher = Dispatcher::new(actuator, replies.clone());
        let dispatcher_shutdown = shutdown.clone();
        let dispatcher = tokio::spawn(async move {
            dispatcher.run(queue_rx, dispatcher_shutdown).await;
        });

        let listener = Listener::new(
            ActionParser::new(config.vocabulary),
            Validator::new(config.bounds),
            config.filter,
            queue_tx,
            replies,
        );
        let listener = tokio::spawn(async move { listener.run(feed.as_ref(), shutdown).await });

        Ok(PipelineHandle {
            trigger,
            listener,
            dispatcher,
        })
    }
}

/// Handle to a running pipeline
pub struct PipelineHandle {
    trigger: ShutdownTrigger,
    listener: JoinHandle<Result<(), FeedError>>,
    dispatcher: JoinHandle<()>,
}

impl PipelineHandle {
    /// Trigger that stops both loops at their next wait
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.trigger.clone()
    }

    /// Wait for both loops to finish.
    ///
    /// A listener failure or panic stops the dispatcher and is returned.
    pub async fn join(self) -> Result<()> {
        let listener_result = match self.listener.await {
            Ok(result) => result,
            Err(e) => {
                error!("Listener task failed: {}", e);
                self.trigger.trigger();
                let _ = self.dispatcher.await;
                return Err(anyhow!("Listener task failed: {}", e));
            }
        };

        if let Err(ref e) = listener_result {
            error!("Listener stopped: {}", e);
            self.trigger.trigger();
        }

        self.dispatcher
            .await
            .map_err(|e| anyhow!("Dispatcher task failed: {}", e))?;

        listener_result.map_err(Into::into)
    }
}
