//! Template rendering and the conventional attachments folder.
//!
//! A template is a directory under the templates root:
//!
//! ```text
//! {templates_root}/{name}/html.tera        required
//! {templates_root}/{name}/text.tera        optional plain-text companion
//! {templates_root}/{name}/attachments/     optional, files become inline
//!                                          attachments
//! ```
//!
//! Rendering uses tera one-off compilation with HTML autoescaping for the
//! html member of the pair; the text companion renders unescaped. Rendered
//! HTML then has its stylesheet rules inlined onto the elements, since most
//! mail clients ignore `<style>` blocks.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::message::Attachment;
use crate::{MailError, MailResult};

/// Predicate deciding whether a folder attachment is included in a send.
pub type AttachmentFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Substitution context for a template send.
///
/// Values are rendered into the template; the optional [`filter`] is never
/// rendered. It is inspected by the composer to decide which folder
/// attachments to include (for example skipping a map-marker image when no
/// map appears in this particular message).
///
/// [`filter`]: Locals::with_filter
///
/// # Examples
///
/// ```
/// use mailroom::Locals;
///
/// let mut locals = Locals::new();
/// locals.insert("name", "Alice".into());
/// let locals = locals.with_filter(|filename| filename != "map-marker.png");
/// ```
#[derive(Clone, Default)]
pub struct Locals {
	values: Map<String, Value>,
	filter: Option<AttachmentFilter>,
}

impl Locals {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set a substitution value.
	pub fn insert(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
		self.values.insert(key.into(), value);
		self
	}

	/// Set the attachment filter. Only filenames for which the predicate
	/// returns `true` are attached; without a filter every folder
	/// attachment is included.
	pub fn with_filter(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
		self.filter = Some(Arc::new(filter));
		self
	}

	pub fn values(&self) -> &Map<String, Value> {
		&self.values
	}

	pub(crate) fn filter(&self) -> Option<&AttachmentFilter> {
		self.filter.as_ref()
	}
}

impl fmt::Debug for Locals {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Locals")
			.field("values", &self.values)
			.field("filter", &self.filter.as_ref().map(|_| "<fn>"))
			.finish()
	}
}

/// Output of a template render: an HTML body and, when the template ships a
/// text companion, its plain-text rendition.
#[derive(Debug, Clone)]
pub struct Rendered {
	pub html: String,
	pub text: Option<String>,
}

/// Render the named template under `root` with the given locals.
///
/// A missing template directory or a missing `html.tera` inside it is a
/// [`MailError::TemplateNotFound`]; engine failures propagate as
/// [`MailError::Template`].
pub(crate) async fn render(root: &Path, name: &str, locals: &Locals) -> MailResult<Rendered> {
	let dir = root.join(name);
	let html_source = match tokio::fs::read_to_string(dir.join("html.tera")).await {
		Ok(source) => source,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
			return Err(MailError::TemplateNotFound(name.to_string()));
		}
		Err(err) => return Err(err.into()),
	};

	let context = tera::Context::from_value(Value::Object(locals.values().clone()))
		.map_err(|err| MailError::Template(format!("{name}: invalid locals: {err}")))?;

	let html = tera::Tera::one_off(&html_source, &context, true)
		.map_err(|err| MailError::Template(format!("{name}: {err}")))?;
	let html = inline_styles(name, &html)?;

	let text = match tokio::fs::read_to_string(dir.join("text.tera")).await {
		Ok(source) => Some(
			tera::Tera::one_off(&source, &context, false)
				.map_err(|err| MailError::Template(format!("{name}: {err}")))?,
		),
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
		Err(err) => return Err(err.into()),
	};

	Ok(Rendered { html, text })
}

// Computed styles go onto the elements for the clients that ignore
// `<style>` blocks; the blocks themselves stay in place for the clients
// that honor them. Remote stylesheets are never fetched, so rendering
// stays deterministic and offline.
fn inline_styles(name: &str, html: &str) -> MailResult<String> {
	let inliner = css_inline::CSSInliner::options()
		.keep_style_tags(true)
		.load_remote_stylesheets(false)
		.build();
	inliner
		.inline(html)
		.map_err(|err| MailError::Template(format!("{name}: style inlining failed: {err}")))
}

/// Enumerate the template's conventional `attachments/` folder.
///
/// A missing folder is not an error: it simply means zero attachments. Each
/// file becomes an inline attachment whose content id is the filename stem;
/// entries are sorted by filename so the resulting MIME part order is
/// deterministic.
pub(crate) async fn folder_attachments(
	root: &Path,
	name: &str,
	filter: Option<&AttachmentFilter>,
) -> MailResult<Vec<Attachment>> {
	let dir = root.join(name).join("attachments");

	let mut entries = match tokio::fs::read_dir(&dir).await {
		Ok(entries) => entries,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
		Err(err) => return Err(err.into()),
	};

	let mut attachments = Vec::new();
	while let Some(entry) = entries.next_entry().await? {
		if !entry.file_type().await?.is_file() {
			continue;
		}
		let filename = entry.file_name().to_string_lossy().into_owned();
		if let Some(filter) = filter {
			if !filter(&filename) {
				continue;
			}
		}
		let content_id = Path::new(&filename)
			.file_stem()
			.map(|stem| stem.to_string_lossy().into_owned())
			.unwrap_or_else(|| filename.clone());
		attachments.push(Attachment::from_path(entry.path()).as_inline(content_id));
	}

	attachments.sort_by(|a, b| a.filename().cmp(b.filename()));
	Ok(attachments)
}
