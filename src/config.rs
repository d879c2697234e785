//! Mail settings and the configuration seam.
//!
//! Settings are plain serde structs so a host can load them from whatever
//! format it already uses (TOML, JSON, environment layering). The
//! [`ConfigSource`] trait is the only thing the mailer depends on; hosts
//! with a live settings store implement it, everyone else wraps a value in
//! [`StaticSource`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::MailResult;

/// Mail settings as supplied by the host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailSettings {
	/// Transport descriptor. Absent means mail is not configured; delivery
	/// fails with a configuration error until an operator fixes this.
	#[serde(default)]
	pub transport: Option<TransportSettings>,
	/// Default sender used when a message carries no `from` of its own.
	#[serde(default)]
	pub from_email: Option<String>,
}

impl MailSettings {
	/// Overlay these settings on top of a fallback, field by field. A source
	/// answering "not configured" falls back to the defaults the mailer was
	/// constructed with rather than failing outright.
	pub fn merged_with(self, fallback: &MailSettings) -> MailSettings {
		MailSettings {
			transport: self.transport.or_else(|| fallback.transport.clone()),
			from_email: self.from_email.or_else(|| fallback.from_email.clone()),
		}
	}
}

/// Describes which transport to build and how.
///
/// `options` is transport-specific: SMTP reads `host`, `port`, `username`,
/// `password` and `starttls`; the pickup transport reads `directory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSettings {
	/// Registry key of the transport: `smtp`, `pickup`, `console` or
	/// `memory`. Unknown kinds fail closed.
	pub kind: String,
	#[serde(default)]
	pub options: Map<String, Value>,
}

impl TransportSettings {
	/// Create a descriptor with no options.
	pub fn new(kind: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			options: Map::new(),
		}
	}

	/// Set a single option, consuming and returning the descriptor.
	pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
		self.options.insert(key.into(), value);
		self
	}

	pub(crate) fn str_option(&self, key: &str) -> Option<&str> {
		self.options.get(key).and_then(Value::as_str)
	}

	pub(crate) fn u16_option(&self, key: &str) -> Option<u16> {
		self.options
			.get(key)
			.and_then(Value::as_u64)
			.and_then(|port| u16::try_from(port).ok())
	}

	pub(crate) fn bool_option(&self, key: &str) -> Option<bool> {
		self.options.get(key).and_then(Value::as_bool)
	}
}

/// Asynchronous source of [`MailSettings`].
///
/// The mailer queries this lazily: once when the transport is first built,
/// and again per send when a default sender is needed.
#[async_trait]
pub trait ConfigSource: Send + Sync {
	async fn mail_settings(&self) -> MailResult<MailSettings>;
}

/// A [`ConfigSource`] that always returns the same settings.
///
/// # Examples
///
/// ```
/// use mailroom::{MailSettings, StaticSource, TransportSettings};
///
/// let source = StaticSource::new(MailSettings {
///     transport: Some(TransportSettings::new("console")),
///     from_email: Some("noreply@example.com".to_string()),
/// });
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
	settings: MailSettings,
}

impl StaticSource {
	pub fn new(settings: MailSettings) -> Self {
		Self { settings }
	}

	/// A source with no transport configured, useful for exercising the
	/// unconfigured failure path.
	pub fn unconfigured() -> Self {
		Self::default()
	}
}

#[async_trait]
impl ConfigSource for StaticSource {
	async fn mail_settings(&self) -> MailResult<MailSettings> {
		Ok(self.settings.clone())
	}
}
