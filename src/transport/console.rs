//! Console transport for development: prints messages to stdout.

use async_trait::async_trait;

use super::{DeliveryReceipt, Transport, mime};
use crate::MailResult;
use crate::message::Message;

/// Prints the assembled message to stdout instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
	async fn deliver(&self, message: &Message) -> MailResult<DeliveryReceipt> {
		let mime = mime::assemble(message).await?;

		println!("{}", String::from_utf8_lossy(&mime.formatted()));
		println!("{}", "-".repeat(70));

		Ok(DeliveryReceipt::new())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_console_delivery_succeeds() {
		let transport = ConsoleTransport;
		let message = Message::new("console@example.com")
			.from("from@example.com")
			.subject("Console test")
			.text("printed, not sent");

		let receipt = transport.deliver(&message).await.unwrap();
		assert!(receipt.artifact.is_none());
		assert!(!receipt.message_id.is_empty());
	}
}
