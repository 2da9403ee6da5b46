//! crawline-queue: durable FIFO contract between the two pipeline stages
//!
//! The broker itself is a collaborator; these traits are the contract the
//! pipeline relies on: publish a message body, deliver at most one
//! unacknowledged message per consumer, acknowledge manually. The shipped
//! implementation is a directory-backed FIFO that redelivers unacked
//! messages after a crash.

pub mod dir_queue;

pub use dir_queue::DirQueue;

use std::io;

/// Error from a queue operation.
#[derive(Debug)]
pub enum QueueError {
    /// Underlying broker/storage failure.
    Io(io::Error),
    /// `receive` was called while a delivery is still unacknowledged.
    /// The single-in-flight contract makes this a caller bug.
    DeliveryOutstanding,
    /// `ack` named a tag that is not the outstanding delivery.
    UnknownTag(String),
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "queue: {e}"),
            Self::DeliveryOutstanding => write!(f, "a delivery is already outstanding"),
            Self::UnknownTag(tag) => write!(f, "unknown delivery tag: {tag}"),
        }
    }
}

impl std::error::Error for QueueError {}

impl From<io::Error> for QueueError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// One delivered message, identified by its acknowledgment tag.
#[derive(Debug)]
pub struct Delivery {
    pub tag: String,
    pub body: Vec<u8>,
}

/// Producer-side capability: enqueue one message body.
pub trait BatchPublisher {
    fn publish(&self, body: &[u8]) -> Result<(), QueueError>;
}

/// Consumer-side capability with a single-in-flight contract:
/// `receive` yields `None` when the queue is currently empty, and fails
/// with [`QueueError::DeliveryOutstanding`] while a previous delivery is
/// unacknowledged.
pub trait BatchConsumer {
    fn receive(&mut self) -> Result<Option<Delivery>, QueueError>;
    fn ack(&mut self, tag: &str) -> Result<(), QueueError>;
}
