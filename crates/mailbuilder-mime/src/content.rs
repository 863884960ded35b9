//! Content providers consumed by the composition engine.
//!
//! Bodies are [`StringContent`] values, inline images and attachments are
//! [`BinaryContent`] values. The engine only reads their fields, so any
//! origin (literal text, an in-memory buffer, a file on disk) works the same
//! way once it has been wrapped here.

use crate::error::{Error, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Charset used when none is given.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Textual body content with its charset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringContent {
    data: String,
    charset: String,
}

impl StringContent {
    /// Creates UTF-8 string content.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self::with_charset(data, DEFAULT_CHARSET)
    }

    /// Creates string content with an explicit charset.
    #[must_use]
    pub fn with_charset(data: impl Into<String>, charset: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            charset: charset.into(),
        }
    }

    /// Returns the text.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Returns the charset label.
    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Returns true if the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<&str> for StringContent {
    fn from(data: &str) -> Self {
        Self::new(data)
    }
}

impl From<String> for StringContent {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

/// Where the bytes of a binary part come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// Bytes already in memory.
    Bytes(Bytes),
    /// A file read at composition time.
    File(PathBuf),
}

impl PayloadSource {
    /// Produces the payload bytes.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a file source cannot be read.
    pub fn read(&self) -> std::io::Result<Bytes> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::File(path) => std::fs::read(path).map(Bytes::from),
        }
    }
}

/// Binary content: an attachment or an inline image.
///
/// Attachments carry a `name`, inline images a `content_id`. The engine uses
/// each value according to the list it was added to, not according to which
/// field is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryContent {
    source: PayloadSource,
    content_type: String,
    name: Option<String>,
    content_id: Option<String>,
}

impl BinaryContent {
    /// Creates binary content from all of its parts.
    #[must_use]
    pub fn new(
        source: PayloadSource,
        content_type: impl Into<String>,
        name: Option<String>,
        content_id: Option<String>,
    ) -> Self {
        Self {
            source,
            content_type: content_type.into(),
            name,
            content_id,
        }
    }

    /// Creates an attachment from in-memory bytes.
    #[must_use]
    pub fn attachment(
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self::new(
            PayloadSource::Bytes(data.into()),
            content_type,
            Some(file_name.into()),
            None,
        )
    }

    /// Creates an attachment read from a file when the message is composed.
    ///
    /// The attachment name is the final component of `path`.
    #[must_use]
    pub fn attachment_from_file(path: impl AsRef<Path>, content_type: impl Into<String>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Self::new(
            PayloadSource::File(path.to_path_buf()),
            content_type,
            name,
            None,
        )
    }

    /// Creates a text attachment, stored as UTF-8.
    ///
    /// `None` text produces an empty attachment.
    #[must_use]
    pub fn text_attachment(
        text: Option<&str>,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        let data = text.map_or_else(Bytes::new, |t| Bytes::copy_from_slice(t.as_bytes()));
        Self::attachment(data, content_type, file_name)
    }

    /// Creates an inline image from in-memory bytes.
    #[must_use]
    pub fn inline_image(
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
        content_id: impl Into<String>,
    ) -> Self {
        Self::new(
            PayloadSource::Bytes(data.into()),
            content_type,
            None,
            Some(content_id.into()),
        )
    }

    /// Creates an inline image read from a file when the message is composed.
    #[must_use]
    pub fn inline_image_from_file(
        path: impl AsRef<Path>,
        content_type: impl Into<String>,
        content_id: impl Into<String>,
    ) -> Self {
        Self::new(
            PayloadSource::File(path.as_ref().to_path_buf()),
            content_type,
            None,
            Some(content_id.into()),
        )
    }

    /// Returns the byte source.
    #[must_use]
    pub const fn source(&self) -> &PayloadSource {
        &self.source
    }

    /// Returns the declared content type string.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the file name, set for attachments.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the content id, set for inline images.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    /// Reads the payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Payload`] naming this part if the source fails.
    pub fn read_payload(&self) -> Result<Bytes> {
        self.source
            .read()
            .map_err(|source| Error::payload(self.label(), source))
    }

    fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if let Some(id) = &self.content_id {
            return format!("content id {id}");
        }
        match &self.source {
            PayloadSource::File(path) => path.display().to_string(),
            PayloadSource::Bytes(_) => "unnamed part".to_string(),
        }
    }
}
