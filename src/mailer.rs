//! The mail composer: the single public entry surface of the crate.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::{ConfigSource, MailSettings};
use crate::message::Message;
use crate::templates::{self, Locals};
use crate::transport::{self, DeliveryReceipt, Transport};
use crate::{MailError, MailResult};

const DEFAULT_TEMPLATES_ROOT: &str = "templates";

/// Composes messages and forwards them to the configured transport.
///
/// The transport is built lazily from configuration on first use and cached
/// for the lifetime of the mailer; construction is single-flight, so
/// concurrent first sends share one instance instead of opening duplicate
/// connections. [`set_transport`](Mailer::set_transport) bypasses
/// configuration entirely, which is how tests and hosts with a live
/// connection plug in.
///
/// Both send operations are linear pipelines: any stage failure
/// short-circuits to the caller, delivery is attempted at most once, and no
/// retries happen here.
pub struct Mailer {
	source: Arc<dyn ConfigSource>,
	fallback: MailSettings,
	templates_root: RwLock<PathBuf>,
	transport: Mutex<Option<Arc<dyn Transport>>>,
}

impl Mailer {
	/// Create a mailer reading settings from the given source.
	pub fn new(source: Arc<dyn ConfigSource>) -> Self {
		Self {
			source,
			fallback: MailSettings::default(),
			templates_root: RwLock::new(PathBuf::from(DEFAULT_TEMPLATES_ROOT)),
			transport: Mutex::new(None),
		}
	}

	/// Supply defaults used when the source answers "not configured" for a
	/// field. A transport missing from both the source and the defaults is
	/// a hard configuration error at delivery time.
	pub fn with_defaults(mut self, fallback: MailSettings) -> Self {
		self.fallback = fallback;
		self
	}

	/// Override the template directory for subsequent calls.
	/// Last write wins.
	pub fn set_templates_root(&self, dir: impl Into<PathBuf>) {
		*self.templates_root.write() = dir.into();
	}

	/// Force-inject a transport, bypassing configuration entirely.
	/// Idempotent; last write wins; affects only calls made after it.
	pub async fn set_transport(&self, transport: Arc<dyn Transport>) {
		*self.transport.lock().await = Some(transport);
	}

	/// Drop the cached transport so the next send rebuilds it from
	/// configuration.
	pub async fn reset_transport(&self) {
		*self.transport.lock().await = None;
	}

	async fn settings(&self) -> MailResult<MailSettings> {
		let settings = self.source.mail_settings().await?;
		Ok(settings.merged_with(&self.fallback))
	}

	/// Get-or-create the transport. Holding the slot lock across
	/// construction gives single-flight behavior: the first caller builds,
	/// concurrent callers wait and observe the cached instance.
	async fn transport(&self) -> MailResult<Arc<dyn Transport>> {
		let mut slot = self.transport.lock().await;
		if let Some(transport) = slot.as_ref() {
			return Ok(Arc::clone(transport));
		}

		let settings = self.settings().await?;
		let descriptor = settings.transport.ok_or_else(|| {
			MailError::Configuration("mail transport is not configured".to_string())
		})?;
		let transport = transport::from_settings(&descriptor)?;
		*slot = Some(Arc::clone(&transport));
		Ok(transport)
	}

	async fn fill_sender(&self, message: &mut Message) -> MailResult<()> {
		if message.from.is_none() {
			message.from = self.settings().await?.from_email;
		}
		Ok(())
	}

	async fn deliver(
		&self,
		transport: Arc<dyn Transport>,
		message: Message,
	) -> MailResult<DeliveryReceipt> {
		match transport.deliver(&message).await {
			Ok(receipt) => {
				debug!(to = ?message.to, message_id = %receipt.message_id, "message delivered");
				Ok(receipt)
			}
			Err(err) => {
				warn!(to = ?message.to, error = %err, "message delivery failed");
				Err(err)
			}
		}
	}

	/// Send a message with caller-supplied text and/or html bodies.
	///
	/// Fails with [`MailError::Validation`] before touching the transport
	/// when the message has no recipient or no body. A default sender from
	/// configuration is filled in when the message carries none.
	pub async fn send(&self, mut message: Message) -> MailResult<DeliveryReceipt> {
		if !message.has_recipient() {
			return Err(MailError::Validation(
				"message 'to' is required".to_string(),
			));
		}
		if !message.has_body() {
			return Err(MailError::Validation(
				"message must have either a text or an html body".to_string(),
			));
		}

		let transport = self.transport().await?;
		self.fill_sender(&mut message).await?;
		self.deliver(transport, message).await
	}

	/// Render the named template and send the result.
	///
	/// Pipeline order matters: the transport is resolved before any render
	/// work, so an unconfigured transport is reported without touching the
	/// filesystem. Rendered output replaces `html`/`text` on the message;
	/// folder attachments (filtered through `locals`) are appended after
	/// any explicit attachments the caller supplied. An empty folder set
	/// leaves the caller's attachments untouched.
	pub async fn send_html(
		&self,
		mut message: Message,
		template_name: &str,
		locals: &Locals,
	) -> MailResult<DeliveryReceipt> {
		if !message.has_recipient() {
			return Err(MailError::Validation(
				"message 'to' is required".to_string(),
			));
		}

		let transport = self.transport().await?;

		let root = self.templates_root.read().clone();
		let rendered = templates::render(&root, template_name, locals).await?;

		self.fill_sender(&mut message).await?;
		message.html = Some(rendered.html);
		message.text = rendered.text;

		let folder = templates::folder_attachments(&root, template_name, locals.filter()).await?;
		if !folder.is_empty() {
			message.attachments.extend(folder);
		}

		self.deliver(transport, message).await
	}
}

impl std::fmt::Debug for Mailer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Mailer")
			.field("templates_root", &*self.templates_root.read())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::StaticSource;
	use crate::transport::MemoryTransport;

	fn mailer_with_memory() -> (Mailer, MemoryTransport) {
		let mailer = Mailer::new(Arc::new(StaticSource::unconfigured()));
		let transport = MemoryTransport::new();
		(mailer, transport)
	}

	#[tokio::test]
	async fn test_send_requires_recipient() {
		let (mailer, transport) = mailer_with_memory();
		mailer.set_transport(Arc::new(transport.clone())).await;

		let message = Message::default().from("from@example.com").text("hi");
		let err = mailer.send(message).await.unwrap_err();

		assert!(matches!(err, MailError::Validation(_)));
		assert_eq!(transport.count(), 0);
	}

	#[tokio::test]
	async fn test_send_requires_body() {
		let (mailer, transport) = mailer_with_memory();
		mailer.set_transport(Arc::new(transport.clone())).await;

		let message = Message::new("to@example.com").from("from@example.com");
		let err = mailer.send(message).await.unwrap_err();

		assert!(matches!(err, MailError::Validation(_)));
		assert_eq!(transport.count(), 0);
	}

	#[tokio::test]
	async fn test_send_fills_default_sender() {
		let settings = MailSettings {
			transport: None,
			from_email: Some("default@example.com".to_string()),
		};
		let mailer = Mailer::new(Arc::new(StaticSource::new(settings)));
		let transport = MemoryTransport::new();
		mailer.set_transport(Arc::new(transport.clone())).await;

		let message = Message::new("to@example.com").text("hi");
		mailer.send(message).await.unwrap();

		let sent = transport.sent();
		assert_eq!(sent[0].from.as_deref(), Some("default@example.com"));
	}

	#[tokio::test]
	async fn test_send_keeps_explicit_sender() {
		let settings = MailSettings {
			transport: None,
			from_email: Some("default@example.com".to_string()),
		};
		let mailer = Mailer::new(Arc::new(StaticSource::new(settings)));
		let transport = MemoryTransport::new();
		mailer.set_transport(Arc::new(transport.clone())).await;

		let message = Message::new("to@example.com")
			.from("explicit@example.com")
			.text("hi");
		mailer.send(message).await.unwrap();

		assert_eq!(
			transport.sent()[0].from.as_deref(),
			Some("explicit@example.com")
		);
	}

	#[tokio::test]
	async fn test_unconfigured_transport_is_a_configuration_error() {
		let mailer = Mailer::new(Arc::new(StaticSource::unconfigured()));
		let message = Message::new("to@example.com")
			.from("from@example.com")
			.text("hi");

		let err = mailer.send(message).await.unwrap_err();
		assert!(matches!(err, MailError::Configuration(_)));
	}

	#[tokio::test]
	async fn test_set_transport_last_write_wins() {
		let mailer = Mailer::new(Arc::new(StaticSource::unconfigured()));
		let first = MemoryTransport::new();
		let second = MemoryTransport::new();

		mailer.set_transport(Arc::new(first.clone())).await;
		mailer.set_transport(Arc::new(second.clone())).await;

		let message = Message::new("to@example.com")
			.from("from@example.com")
			.text("hi");
		mailer.send(message).await.unwrap();

		assert_eq!(first.count(), 0);
		assert_eq!(second.count(), 1);
	}
}
