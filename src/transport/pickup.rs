//! Pickup transport: persists each message as a file in a spool directory.
//!
//! Useful for local development and integration tests; the returned receipt
//! points at the written file so callers can inspect the exact wire format.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::{DeliveryReceipt, Transport, mime};
use crate::MailResult;
use crate::message::Message;

/// Writes fully assembled MIME messages into a directory, one `.eml` file
/// per message. The directory is created on first delivery if missing.
#[derive(Debug, Clone)]
pub struct PickupTransport {
	directory: PathBuf,
}

impl PickupTransport {
	pub fn new(directory: impl Into<PathBuf>) -> Self {
		Self {
			directory: directory.into(),
		}
	}

	pub fn directory(&self) -> &PathBuf {
		&self.directory
	}

	// Timestamp plus a random component keeps names unique under rapid or
	// concurrent sends.
	fn unique_filename(message_id: &str) -> String {
		format!("{}-{message_id}.eml", Utc::now().format("%Y%m%d%H%M%S%3f"))
	}
}

#[async_trait]
impl Transport for PickupTransport {
	async fn deliver(&self, message: &Message) -> MailResult<DeliveryReceipt> {
		let mime = mime::assemble(message).await?;

		tokio::fs::create_dir_all(&self.directory).await?;

		let receipt = DeliveryReceipt::new();
		let path = self
			.directory
			.join(Self::unique_filename(&receipt.message_id));
		tokio::fs::write(&path, mime.formatted()).await?;

		Ok(receipt.with_artifact(path))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn sample_message(body: &str) -> Message {
		Message::new("to@example.com")
			.from("from@example.com")
			.subject("Spool test")
			.text(body)
	}

	#[tokio::test]
	async fn test_delivery_writes_artifact() {
		let spool = TempDir::with_prefix("mailroom_spool_").unwrap();
		let transport = PickupTransport::new(spool.path());

		let receipt = transport.deliver(&sample_message("spooled")).await.unwrap();

		let path = receipt.artifact.expect("pickup receipt carries a path");
		let raw = std::fs::read_to_string(&path).unwrap();
		assert!(raw.contains("spooled"));
	}

	#[tokio::test]
	async fn test_delivery_creates_missing_directory() {
		let spool = TempDir::with_prefix("mailroom_spool_").unwrap();
		let nested = spool.path().join("outbox/today");
		let transport = PickupTransport::new(&nested);

		transport.deliver(&sample_message("nested")).await.unwrap();
		assert!(nested.is_dir());
	}

	#[tokio::test]
	async fn test_filenames_are_unique() {
		let spool = TempDir::with_prefix("mailroom_spool_").unwrap();
		let transport = PickupTransport::new(spool.path());

		for i in 0..10 {
			transport
				.deliver(&sample_message(&format!("message {i}")))
				.await
				.unwrap();
		}

		let files: Vec<_> = std::fs::read_dir(spool.path())
			.unwrap()
			.filter_map(|entry| entry.ok())
			.collect();
		assert_eq!(files.len(), 10);
	}
}
