//! Delivery transports.
//!
//! A transport takes a finished [`Message`] and moves it somewhere: an SMTP
//! relay, a spool directory, stdout, or an in-process buffer. Kinds are
//! resolved from [`TransportSettings`] through the fixed registry in
//! [`from_settings`]; there is no dynamic loading and no silent fallback.

mod console;
mod memory;
mod mime;
mod pickup;
mod smtp;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

pub use console::ConsoleTransport;
pub use memory::MemoryTransport;
pub use pickup::PickupTransport;
pub use smtp::{SmtpOptions, SmtpTransport};

use crate::config::TransportSettings;
use crate::message::Message;
use crate::{MailError, MailResult};

/// Outcome of a successful delivery.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
	/// Unique identifier assigned to the delivered message.
	pub message_id: String,
	/// For file-based transports, the path of the persisted message.
	pub artifact: Option<PathBuf>,
}

impl DeliveryReceipt {
	pub(crate) fn new() -> Self {
		Self {
			message_id: uuid::Uuid::new_v4().to_string(),
			artifact: None,
		}
	}

	pub(crate) fn with_artifact(mut self, path: PathBuf) -> Self {
		self.artifact = Some(path);
		self
	}
}

/// Capability contract every concrete transport satisfies.
///
/// Delivery is attempted at most once per call; retry policy belongs to the
/// caller. Timeouts, if any, belong to the transport implementation.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
	async fn deliver(&self, message: &Message) -> MailResult<DeliveryReceipt>;
}

/// Build a transport from its settings descriptor.
///
/// Unknown kinds fail with [`MailError::UnknownTransport`] rather than
/// falling back to a default.
pub fn from_settings(settings: &TransportSettings) -> MailResult<Arc<dyn Transport>> {
	match settings.kind.as_str() {
		"smtp" => Ok(Arc::new(SmtpTransport::new(SmtpOptions::from_settings(
			settings,
		)?)?)),
		"pickup" => {
			let directory = settings.str_option("directory").ok_or_else(|| {
				MailError::Configuration(
					"pickup transport requires a 'directory' option".to_string(),
				)
			})?;
			Ok(Arc::new(PickupTransport::new(directory)))
		}
		"console" => Ok(Arc::new(ConsoleTransport)),
		"memory" => Ok(Arc::new(MemoryTransport::new())),
		other => Err(MailError::UnknownTransport(other.to_string())),
	}
}
