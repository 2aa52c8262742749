//! Publisher handle

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::context::{Context, HandleGuard};
use crate::message::RosMessage;
use crate::transport::{ClientMessage, Transport};
use crate::utils::Result;

/// Typed publishing endpoint bound to one resolved topic.
///
/// The type parameter `M` ensures only one message type goes out on the topic.
pub struct Publisher<M, T: Transport> {
    topic: String,
    qos: u8,
    context: Context<T>,
    published: u64,
    last_published: Option<DateTime<Utc>>,
    _guard: HandleGuard,
    _marker: PhantomData<fn(M)>,
}

impl<M, T: Transport> std::fmt::Debug for Publisher<M, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("topic", &self.topic)
            .field("qos", &self.qos)
            .field("published", &self.published)
            .finish()
    }
}

impl<M: RosMessage, T: Transport> Publisher<M, T> {
    pub(crate) fn new(context: Context<T>, topic: String, qos: u8) -> Self {
        Self {
            topic,
            qos,
            context,
            published: 0,
            last_published: None,
            _guard: HandleGuard::acquire(),
            _marker: PhantomData,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn qos(&self) -> u8 {
        self.qos
    }

    /// Number of messages handed to the transport so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn last_published(&self) -> Option<DateTime<Utc>> {
        self.last_published
    }

    pub async fn publish(&mut self, msg: &M) -> Result<()> {
        let payload = msg.to_payload()?;
        let frame = ClientMessage::publish(&self.topic, payload, self.qos);
        self.context.send(frame).await?;

        self.published += 1;
        self.last_published = Some(Utc::now());
        debug!("Published {} on {}", M::TYPE_NAME, self.topic);
        Ok(())
    }
}
