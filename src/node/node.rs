use tracing::info;

use super::names::{resolve_topic, validate_namespace, validate_node_name};
use super::publisher::Publisher;
use crate::context::Context;
use crate::message::RosMessage;
use crate::transport::Transport;
use crate::utils::{Result, TalkerError};

/// A named participant on the middleware.
///
/// Nodes are created from a live [`Context`] and keep it alive for as long
/// as they exist.
#[derive(Debug)]
pub struct Node<T: Transport> {
    name: String,
    namespace: String,
    context: Context<T>,
}

impl<T: Transport> Node<T> {
    pub fn new(context: &Context<T>, name: &str, namespace: &str) -> Result<Self> {
        validate_node_name(name)?;
        validate_namespace(namespace)?;
        if !context.ok() {
            return Err(TalkerError::ContextShutdown);
        }

        let node = Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            context: context.clone(),
        };
        info!("Node created: {}", node.fully_qualified_name());
        Ok(node)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn fully_qualified_name(&self) -> String {
        if self.namespace.ends_with('/') {
            format!("{}{}", self.namespace, self.name)
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }

    pub fn context(&self) -> &Context<T> {
        &self.context
    }

    /// Registers a publishing endpoint for `topic`, resolved against this
    /// node's namespace.
    pub fn create_publisher<M: RosMessage>(&self, topic: &str, qos: u8) -> Result<Publisher<M, T>> {
        if !self.context.ok() {
            return Err(TalkerError::ContextShutdown);
        }
        let topic = resolve_topic(&self.namespace, topic)?;
        info!("Publisher created for topic: {topic} ({})", M::TYPE_NAME);
        Ok(Publisher::new(self.context.clone(), topic, qos))
    }
}
