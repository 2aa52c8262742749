//! Nodes, publishers and the talker.
//!
//! A [`Node`] is created from a [`crate::context::Context`], a [`Publisher`]
//! from a node, and the [`Talker`] wires one of each to a [`Timer`].

pub mod names;
mod node;
pub mod publisher;
pub mod talker;
pub mod timer;

pub use node::Node;
pub use publisher::Publisher;
pub use talker::Talker;
pub use timer::Timer;

#[cfg(test)]
mod tests;
