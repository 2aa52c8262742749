//! The talker node: one publisher, one timer, one message per tick.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use super::node::Node;
use super::publisher::Publisher;
use super::timer::Timer;
use crate::config::Settings;
use crate::context::Context;
use crate::message::std_msgs;
use crate::transport::Transport;
use crate::utils::Result;

#[derive(Debug)]
pub struct Talker<T: Transport> {
    node: Node<T>,
    publisher: Publisher<std_msgs::String, T>,
    timer: Timer,
    prefix: String,
    count: u64,
    max_messages: Option<u64>,
}

impl<T: Transport> Talker<T> {
    /// Creates the node and its publisher on `context` and arms the timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(context: &Context<T>, settings: &Settings) -> Result<Self> {
        let node = Node::new(context, &settings.node.name, &settings.node.namespace)?;
        let publisher = node.create_publisher::<std_msgs::String>(
            &settings.publisher.topic,
            settings.publisher.qos,
        )?;
        let timer = Timer::new(Duration::from_millis(settings.publisher.period_ms))?;

        info!(
            "Talker {} publishing on {} every {}ms",
            node.fully_qualified_name(),
            publisher.topic(),
            settings.publisher.period_ms
        );

        Ok(Self {
            node,
            publisher,
            timer,
            prefix: settings.publisher.message_prefix.clone(),
            count: 0,
            max_messages: settings.publisher.max_messages,
        })
    }

    pub fn node(&self) -> &Node<T> {
        &self.node
    }

    pub fn publisher(&self) -> &Publisher<std_msgs::String, T> {
        &self.publisher
    }

    /// Sequence number the next message will carry.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Builds the next message and publishes it.
    ///
    /// The sequence number is consumed even when publishing fails, so every
    /// message that does go out carries a larger number than the one before.
    pub async fn on_tick(&mut self) -> Result<std_msgs::String> {
        let msg = std_msgs::String::new(format!("{}{}", self.prefix, self.count));
        self.count += 1;

        info!("Publishing: '{}'", msg.data);
        self.publisher.publish(&msg).await?;
        Ok(msg)
    }

    /// Publishes on every timer tick until `shutdown` resolves, the message
    /// limit is reached, or the context goes away.
    ///
    /// Returns the number of messages published.
    pub async fn spin<F>(&mut self, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            if self.max_messages.is_some_and(|max| self.count >= max) {
                info!("Reached {} messages, stopping", self.count);
                break;
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received. Stopping talker.");
                    break;
                }
                _ = self.timer.tick() => {
                    // A publish stuck on a slow broker must not hold off shutdown.
                    let outcome = tokio::select! {
                        _ = &mut shutdown => {
                            info!("Shutdown signal received during publish. Stopping talker.");
                            break;
                        }
                        outcome = self.on_tick() => outcome,
                    };
                    match outcome {
                        Ok(_) => {}
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => warn!("Publish failed: {e}"),
                    }
                }
            }
        }

        Ok(self.publisher.published())
    }

    /// Releases the publisher and node, then shuts the context down.
    pub async fn shutdown(self) -> Result<()> {
        let context = self.node.context().clone();
        info!(
            "Shutting down {} after {} messages",
            self.node.fully_qualified_name(),
            self.publisher.published()
        );
        drop(self);
        context.shutdown().await
    }
}
