//! # Mailroom
//!
//! Template-driven email sending with pluggable transports.
//!
//! Mailroom is a small mail facade meant to be embedded in a larger
//! application host. It composes a message from an envelope (sender,
//! recipients, subject and either raw text/html bodies or a named template
//! with substitution locals), resolves a configured transport, and hands the
//! finished message over for delivery.
//!
//! ## Features
//!
//! - **Pluggable transports**: SMTP (via lettre), a pickup directory that
//!   persists messages as files, console output for development, and an
//!   in-memory transport for tests. Transport kinds are resolved from
//!   configuration through a fixed registry; unknown kinds fail closed.
//! - **Lazy transport construction**: the transport is built from
//!   configuration on first use and cached for the process lifetime, with
//!   single-flight guarding so concurrent sends share one instance. Tests
//!   and hosts holding a live connection can inject a transport directly.
//! - **Template rendering**: each template is a directory under a
//!   configurable root holding an HTML source and an optional plain-text
//!   companion, rendered with tera. Stylesheet rules in the rendered HTML
//!   are inlined onto the elements for mail clients that ignore `<style>`
//!   blocks.
//! - **Conventional attachments**: files in a template's `attachments/`
//!   subfolder become inline attachments, appended after any explicit
//!   attachments supplied on the message, with per-send filtering.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mailroom::{Mailer, MailSettings, Message, StaticSource, TransportSettings};
//!
//! # async fn example() -> mailroom::MailResult<()> {
//! let settings = MailSettings {
//!     transport: Some(TransportSettings::new("console")),
//!     from_email: Some("noreply@example.com".to_string()),
//! };
//! let mailer = Mailer::new(Arc::new(StaticSource::new(settings)));
//!
//! let message = Message::new("user@example.com")
//!     .subject("Welcome!")
//!     .text("Thanks for signing up.");
//!
//! let receipt = mailer.send(message).await?;
//! println!("delivered as {}", receipt.message_id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Template sends
//!
//! ```rust,no_run
//! use mailroom::{Locals, Message};
//! # use std::sync::Arc;
//! # use mailroom::{Mailer, MailSettings, StaticSource};
//! # async fn example(mailer: Mailer) -> mailroom::MailResult<()> {
//! let mut locals = Locals::new();
//! locals.insert("link", "https://example.com/confirm/123".into());
//!
//! let message = Message::new("user@example.com").subject("Confirm your address");
//! mailer.send_html(message, "confirm_url", &locals).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod mailer;
pub mod message;
pub mod templates;
pub mod transport;

use thiserror::Error;

pub use config::{ConfigSource, MailSettings, StaticSource, TransportSettings};
pub use mailer::Mailer;
pub use message::{Attachment, AttachmentSource, Disposition, Message};
pub use templates::{Locals, Rendered};
pub use transport::{
	ConsoleTransport, DeliveryReceipt, MemoryTransport, PickupTransport, SmtpTransport, Transport,
};

/// Errors produced while composing or delivering mail.
///
/// Nothing in this crate retries: every error propagates to the caller, who
/// owns the retry policy.
#[derive(Debug, Error)]
pub enum MailError {
	/// The message envelope is incomplete (missing recipient or body).
	#[error("Invalid message: {0}")]
	Validation(String),

	/// Mail settings are absent or malformed; delivery cannot proceed until
	/// an operator fixes the configuration.
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// The configured transport kind is not in the registry.
	#[error("Unknown transport kind: {0}")]
	UnknownTransport(String),

	/// No template of the requested name exists under the templates root.
	#[error("Template not found: {0}")]
	TemplateNotFound(String),

	/// The template exists but failed to render.
	#[error("Template error: {0}")]
	Template(String),

	/// A sender or recipient could not be parsed as a mailbox.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),

	/// The transport accepted the message but failed to deliver it.
	#[error("Delivery error: {0}")]
	Delivery(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type MailResult<T> = std::result::Result<T, MailError>;
