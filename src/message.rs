use std::path::{Path, PathBuf};

use crate::{MailError, MailResult};

/// An email message to be composed and delivered.
///
/// Created by the caller, completed by the [`Mailer`](crate::Mailer) (default
/// sender, rendered bodies, merged attachments), then handed to the
/// transport.
///
/// # Examples
///
/// ```
/// use mailroom::Message;
///
/// let message = Message::new("user@example.com")
///     .from("noreply@example.com")
///     .subject("Hello")
///     .text("Plain body")
///     .html("<p>HTML body</p>");
/// assert_eq!(message.to, vec!["user@example.com".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Message {
	/// Sender address; filled from configuration when unset.
	pub from: Option<String>,
	/// Recipient addresses. Must be non-empty for any send.
	pub to: Vec<String>,
	/// Subject line.
	pub subject: String,
	/// Plain text body.
	pub text: Option<String>,
	/// HTML body.
	pub html: Option<String>,
	/// Explicit attachments. Template folder attachments are appended after
	/// these, never in front of them.
	pub attachments: Vec<Attachment>,
}

impl Message {
	/// Create a message addressed to a single recipient.
	pub fn new(to: impl Into<String>) -> Self {
		Self {
			to: vec![to.into()],
			..Self::default()
		}
	}

	/// Add another recipient.
	pub fn to(mut self, recipient: impl Into<String>) -> Self {
		self.to.push(recipient.into());
		self
	}

	/// Set the sender address. Accepts both bare addresses and the
	/// `Name <address>` form.
	pub fn from(mut self, sender: impl Into<String>) -> Self {
		self.from = Some(sender.into());
		self
	}

	/// Set the subject line.
	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = subject.into();
		self
	}

	/// Set the plain text body.
	pub fn text(mut self, body: impl Into<String>) -> Self {
		self.text = Some(body.into());
		self
	}

	/// Set the HTML body.
	pub fn html(mut self, body: impl Into<String>) -> Self {
		self.html = Some(body.into());
		self
	}

	/// Add an explicit attachment.
	pub fn attachment(mut self, attachment: Attachment) -> Self {
		self.attachments.push(attachment);
		self
	}

	pub(crate) fn has_recipient(&self) -> bool {
		self.to.iter().any(|to| !to.trim().is_empty())
	}

	pub(crate) fn has_body(&self) -> bool {
		let filled = |body: &Option<String>| body.as_deref().is_some_and(|b| !b.is_empty());
		filled(&self.text) || filled(&self.html)
	}
}

/// Where an attachment's bytes come from.
///
/// Exactly one source is ever set: folder attachments reference their on-disk
/// file and are read at MIME assembly time, explicit attachments usually
/// carry their content inline.
#[derive(Debug, Clone)]
pub enum AttachmentSource {
	/// Read the file at this path when the message is assembled.
	Path(PathBuf),
	/// Content supplied directly by the caller.
	Bytes(Vec<u8>),
}

/// How an attachment is presented to the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
	/// Referenced from the HTML body through its content id.
	Inline,
	/// A regular downloadable attachment.
	Attached,
}

/// A file attached to a [`Message`].
///
/// # Examples
///
/// ```
/// use mailroom::Attachment;
///
/// let report = Attachment::from_bytes("report.pdf", b"PDF content".to_vec());
/// assert_eq!(report.filename(), "report.pdf");
/// assert!(report.mime_type().contains("pdf"));
///
/// let logo = Attachment::inline("logo.png", vec![0x89, 0x50, 0x4e, 0x47], "logo");
/// assert_eq!(logo.content_id(), Some("logo"));
/// ```
#[derive(Debug, Clone)]
pub struct Attachment {
	filename: String,
	source: AttachmentSource,
	mime_type: String,
	content_id: Option<String>,
	disposition: Disposition,
}

impl Attachment {
	/// Create a regular attachment from raw bytes. The MIME type is detected
	/// from the filename extension.
	pub fn from_bytes(filename: impl Into<String>, content: Vec<u8>) -> Self {
		let filename = filename.into();
		let mime_type = detect_mime_type(&filename);
		Self {
			filename,
			source: AttachmentSource::Bytes(content),
			mime_type,
			content_id: None,
			disposition: Disposition::Attached,
		}
	}

	/// Create a regular attachment backed by a file on disk. The filename is
	/// the path's basename; the content is read when the message is
	/// assembled, not up front.
	pub fn from_path(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let filename = path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default();
		let mime_type = detect_mime_type(&filename);
		Self {
			filename,
			source: AttachmentSource::Path(path),
			mime_type,
			content_id: None,
			disposition: Disposition::Attached,
		}
	}

	/// Create an inline attachment (for images embedded in HTML bodies).
	pub fn inline(
		filename: impl Into<String>,
		content: Vec<u8>,
		content_id: impl Into<String>,
	) -> Self {
		Self::from_bytes(filename, content).as_inline(content_id)
	}

	/// Mark this attachment as inline with the given content id.
	pub fn as_inline(mut self, content_id: impl Into<String>) -> Self {
		self.content_id = Some(content_id.into());
		self.disposition = Disposition::Inline;
		self
	}

	/// Override the detected MIME type.
	pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
		self.mime_type = mime_type.into();
		self
	}

	pub fn filename(&self) -> &str {
		&self.filename
	}

	pub fn source(&self) -> &AttachmentSource {
		&self.source
	}

	pub fn mime_type(&self) -> &str {
		&self.mime_type
	}

	pub fn content_id(&self) -> Option<&str> {
		self.content_id.as_deref()
	}

	pub fn disposition(&self) -> Disposition {
		self.disposition
	}

	/// Resolve the attachment content, reading from disk for path sources.
	pub(crate) async fn load_content(&self) -> MailResult<Vec<u8>> {
		match &self.source {
			AttachmentSource::Bytes(bytes) => Ok(bytes.clone()),
			AttachmentSource::Path(path) => tokio::fs::read(path).await.map_err(|err| {
				MailError::Io(std::io::Error::new(
					err.kind(),
					format!("failed to read attachment {}: {err}", path.display()),
				))
			}),
		}
	}
}

fn detect_mime_type(filename: &str) -> String {
	mime_guess::from_path(Path::new(filename))
		.first()
		.map(|mime| mime.to_string())
		.unwrap_or_else(|| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_mime_type_detection() {
		let png = Attachment::from_bytes("logo.png", vec![]);
		assert_eq!(png.mime_type(), "image/png");

		let unknown = Attachment::from_bytes("data.unknownext", vec![]);
		assert_eq!(unknown.mime_type(), "application/octet-stream");
	}

	#[test]
	fn test_from_path_uses_basename() {
		let attachment = Attachment::from_path("/tmp/some/dir/report.pdf");
		assert_eq!(attachment.filename(), "report.pdf");
		assert_eq!(attachment.disposition(), Disposition::Attached);
		assert!(matches!(attachment.source(), AttachmentSource::Path(_)));
	}

	#[test]
	fn test_inline_sets_content_id_and_disposition() {
		let attachment = Attachment::inline("logo.png", vec![1, 2, 3], "logo");
		assert_eq!(attachment.content_id(), Some("logo"));
		assert_eq!(attachment.disposition(), Disposition::Inline);
	}

	#[test]
	fn test_message_body_detection() {
		let empty = Message::new("user@example.com");
		assert!(!empty.has_body());

		let blank = Message::new("user@example.com").text("");
		assert!(!blank.has_body());

		let text = Message::new("user@example.com").text("hi");
		assert!(text.has_body());

		let html = Message::new("user@example.com").html("<p>hi</p>");
		assert!(html.has_body());
	}

	#[test]
	fn test_message_recipient_detection() {
		let mut message = Message::default();
		assert!(!message.has_recipient());

		message.to.push("  ".to_string());
		assert!(!message.has_recipient());

		message.to.push("user@example.com".to_string());
		assert!(message.has_recipient());
	}
}
