//! Assembly of the wire-format MIME message.
//!
//! Shared by every transport that needs a full RFC 5322 message: text and
//! html bodies become a `multipart/alternative` pair, attachments wrap the
//! body in `multipart/mixed`. Explicit attachments carry a
//! `Content-Disposition: attachment` with their filename; folder-derived
//! ones are inline parts addressed by `Content-ID`.

use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimePart, Body, Mailbox, MultiPart, SinglePart};

use crate::message::{Disposition, Message};
use crate::{MailError, MailResult};

enum BodyPart {
	Multi(MultiPart),
	Single(SinglePart),
}

/// Build the lettre message for a composed [`Message`].
///
/// The sender must be resolved by this point; path-sourced attachments are
/// read from disk here.
pub(crate) async fn assemble(message: &Message) -> MailResult<lettre::Message> {
	let from = message.from.as_deref().ok_or_else(|| {
		MailError::Configuration(
			"message has no sender and no default sender is configured".to_string(),
		)
	})?;

	let mut builder = lettre::Message::builder()
		.from(mailbox(from)?)
		.subject(message.subject.clone());
	for to in &message.to {
		builder = builder.to(mailbox(to)?);
	}

	let body = match (&message.text, &message.html) {
		(Some(text), Some(html)) => BodyPart::Multi(MultiPart::alternative_plain_html(
			text.clone(),
			html.clone(),
		)),
		(Some(text), None) => BodyPart::Single(SinglePart::plain(text.clone())),
		(None, Some(html)) => BodyPart::Single(SinglePart::html(html.clone())),
		(None, None) => {
			return Err(MailError::Validation(
				"message must have either a text or an html body".to_string(),
			));
		}
	};

	if message.attachments.is_empty() {
		return match body {
			BodyPart::Multi(part) => builder.multipart(part),
			BodyPart::Single(part) => builder.singlepart(part),
		}
		.map_err(build_error);
	}

	let mut mixed = match body {
		BodyPart::Multi(part) => MultiPart::mixed().multipart(part),
		BodyPart::Single(part) => MultiPart::mixed().singlepart(part),
	};

	for attachment in &message.attachments {
		let content = attachment.load_content().await?;
		let content_type = ContentType::parse(attachment.mime_type()).map_err(|err| {
			MailError::Validation(format!(
				"attachment {} has invalid MIME type {}: {err}",
				attachment.filename(),
				attachment.mime_type(),
			))
		})?;

		let part = match attachment.disposition() {
			Disposition::Attached => MimePart::new(attachment.filename().to_string())
				.body(Body::new(content), content_type),
			Disposition::Inline => {
				// Content id defaults to the filename stem, matching the
				// convention used for template folder attachments.
				let content_id = attachment
					.content_id()
					.map(str::to_string)
					.unwrap_or_else(|| file_stem(attachment.filename()));
				MimePart::new_inline(content_id).body(Body::new(content), content_type)
			}
		};
		mixed = mixed.singlepart(part);
	}

	builder.multipart(mixed).map_err(build_error)
}

fn mailbox(address: &str) -> MailResult<Mailbox> {
	address
		.trim()
		.parse::<Mailbox>()
		.map_err(|err| MailError::InvalidAddress(format!("{address}: {err}")))
}

fn build_error(err: lettre::error::Error) -> MailError {
	MailError::Delivery(format!("failed to build MIME message: {err}"))
}

fn file_stem(filename: &str) -> String {
	Path::new(filename)
		.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.unwrap_or_else(|| filename.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::message::Attachment;

	#[tokio::test]
	async fn test_assemble_plain_text() {
		let message = Message::new("to@example.com")
			.from("from@example.com")
			.subject("Subject line")
			.text("Hello from the mailroom");

		let mime = assemble(&message).await.unwrap();
		let raw = String::from_utf8_lossy(&mime.formatted()).into_owned();
		assert!(raw.contains("Hello from the mailroom"));
		assert!(raw.contains("Subject: Subject line"));
	}

	#[tokio::test]
	async fn test_assemble_alternative_pair() {
		let message = Message::new("to@example.com")
			.from("from@example.com")
			.text("plain")
			.html("<p>rich</p>");

		let mime = assemble(&message).await.unwrap();
		let raw = String::from_utf8_lossy(&mime.formatted()).into_owned();
		assert!(raw.contains("multipart/alternative"));
	}

	#[tokio::test]
	async fn test_assemble_attachment_dispositions() {
		let message = Message::new("to@example.com")
			.from("from@example.com")
			.text("see attachments")
			.attachment(Attachment::from_bytes("report.txt", b"data".to_vec()))
			.attachment(Attachment::inline("logo.png", vec![1, 2, 3], "logo"));

		let mime = assemble(&message).await.unwrap();
		let raw = String::from_utf8_lossy(&mime.formatted()).into_owned();
		assert!(raw.contains("multipart/mixed"));
		assert!(raw.contains("Content-Disposition: attachment"));
		assert!(raw.contains("report.txt"));
		assert!(raw.contains("Content-Disposition: inline"));
		assert!(raw.contains("<logo>"));
	}

	#[tokio::test]
	async fn test_assemble_rejects_unparseable_address() {
		let message = Message::new("not an address")
			.from("from@example.com")
			.text("hi");

		let err = assemble(&message).await.unwrap_err();
		assert!(matches!(err, MailError::InvalidAddress(_)));
	}

	#[tokio::test]
	async fn test_assemble_requires_sender() {
		let message = Message::new("to@example.com").text("hi");
		let err = assemble(&message).await.unwrap_err();
		assert!(matches!(err, MailError::Configuration(_)));
	}
}
