//! SMTP transport backed by lettre.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use super::{DeliveryReceipt, Transport, mime};
use crate::config::TransportSettings;
use crate::message::Message;
use crate::{MailError, MailResult};

/// Connection options for the SMTP transport.
#[derive(Debug, Clone)]
pub struct SmtpOptions {
	/// Relay hostname.
	pub host: String,
	/// Relay port, 587 by default.
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<String>,
	/// Use STARTTLS (default) rather than an implicit TLS connection.
	pub starttls: bool,
}

impl SmtpOptions {
	pub fn new(host: impl Into<String>) -> Self {
		Self {
			host: host.into(),
			port: 587,
			username: None,
			password: None,
			starttls: true,
		}
	}

	pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
		self.username = Some(username.into());
		self.password = Some(password.into());
		self
	}

	pub fn port(mut self, port: u16) -> Self {
		self.port = port;
		self
	}

	/// Read options out of a transport settings descriptor.
	pub fn from_settings(settings: &TransportSettings) -> MailResult<Self> {
		let host = settings.str_option("host").ok_or_else(|| {
			MailError::Configuration("smtp transport requires a 'host' option".to_string())
		})?;

		let mut options = Self::new(host);
		if let Some(port) = settings.u16_option("port") {
			options.port = port;
		}
		options.username = settings.str_option("username").map(str::to_string);
		options.password = settings.str_option("password").map(str::to_string);
		if let Some(starttls) = settings.bool_option("starttls") {
			options.starttls = starttls;
		}
		Ok(options)
	}
}

/// Delivers messages through an SMTP relay.
pub struct SmtpTransport {
	inner: AsyncSmtpTransport<Tokio1Executor>,
	options: SmtpOptions,
}

impl SmtpTransport {
	pub fn new(options: SmtpOptions) -> MailResult<Self> {
		let mut builder = if options.starttls {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&options.host)
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::relay(&options.host)
		}
		.map_err(|err| {
			MailError::Configuration(format!("failed to create SMTP transport: {err}"))
		})?;

		builder = builder.port(options.port);

		if let (Some(username), Some(password)) = (&options.username, &options.password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
		}

		Ok(Self {
			inner: builder.build(),
			options,
		})
	}
}

#[async_trait]
impl Transport for SmtpTransport {
	async fn deliver(&self, message: &Message) -> MailResult<DeliveryReceipt> {
		let mime = mime::assemble(message).await?;
		self.inner
			.send(mime)
			.await
			.map_err(|err| MailError::Delivery(format!("SMTP delivery failed: {err}")))?;
		Ok(DeliveryReceipt::new())
	}
}

// AsyncSmtpTransport does not implement Debug.
impl std::fmt::Debug for SmtpTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SmtpTransport")
			.field("host", &self.options.host)
			.field("port", &self.options.port)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_options_from_settings() {
		let settings = TransportSettings::new("smtp")
			.option("host", json!("mail.example.com"))
			.option("port", json!(2525))
			.option("username", json!("mailer"))
			.option("password", json!("secret"))
			.option("starttls", json!(false));

		let options = SmtpOptions::from_settings(&settings).unwrap();
		assert_eq!(options.host, "mail.example.com");
		assert_eq!(options.port, 2525);
		assert_eq!(options.username.as_deref(), Some("mailer"));
		assert!(!options.starttls);
	}

	#[test]
	fn test_options_defaults() {
		let settings = TransportSettings::new("smtp").option("host", json!("mail.example.com"));
		let options = SmtpOptions::from_settings(&settings).unwrap();
		assert_eq!(options.port, 587);
		assert!(options.starttls);
		assert!(options.username.is_none());
	}

	#[test]
	fn test_options_require_host() {
		let err = SmtpOptions::from_settings(&TransportSettings::new("smtp")).unwrap_err();
		assert!(matches!(err, MailError::Configuration(_)));
	}
}
