//! In-memory transport for tests.
//!
//! Records every delivered message in-process without sending anything, so
//! tests can assert on exactly what the composer handed over.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{DeliveryReceipt, Transport};
use crate::MailResult;
use crate::message::Message;

/// Stores delivered messages in memory.
///
/// Clones share the same buffer, so a test can keep a handle while the
/// mailer owns another.
///
/// # Examples
///
/// ```
/// use mailroom::{MemoryTransport, Message, Transport};
///
/// # #[tokio::main]
/// # async fn main() {
/// let transport = MemoryTransport::new();
/// let message = Message::new("user@example.com")
///     .from("noreply@example.com")
///     .text("hi");
///
/// transport.deliver(&message).await.unwrap();
/// assert_eq!(transport.count(), 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
	sent: Arc<RwLock<Vec<Message>>>,
}

impl MemoryTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// All messages delivered so far.
	pub fn sent(&self) -> Vec<Message> {
		self.sent.read().clone()
	}

	pub fn count(&self) -> usize {
		self.sent.read().len()
	}

	pub fn clear(&self) {
		self.sent.write().clear();
	}
}

#[async_trait]
impl Transport for MemoryTransport {
	async fn deliver(&self, message: &Message) -> MailResult<DeliveryReceipt> {
		self.sent.write().push(message.clone());
		Ok(DeliveryReceipt::new())
	}
}
