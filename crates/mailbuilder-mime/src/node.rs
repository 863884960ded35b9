//! The composed MIME tree.

use crate::content_type::ContentType;
use crate::header::Headers;
use bytes::Bytes;

/// Kind of a multipart container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartKind {
    /// Independent parts shown together (body plus attachments).
    Mixed,
    /// Renderings of the same content, least preferred first.
    Alternative,
    /// Parts referencing each other (HTML plus its inline images).
    Related,
}

impl MultipartKind {
    /// Returns the MIME subtype.
    #[must_use]
    pub const fn subtype(self) -> &'static str {
        match self {
            Self::Mixed => "mixed",
            Self::Alternative => "alternative",
            Self::Related => "related",
        }
    }
}

/// Payload of a leaf part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafBody {
    /// Text, encoded with the charset from the content type.
    Text(String),
    /// Opaque binary data.
    Binary(Bytes),
}

/// A single content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Content type, with a `charset` parameter for text leaves.
    pub content_type: ContentType,
    /// Payload.
    pub body: LeafBody,
    /// File name, set for attachments.
    pub file_name: Option<String>,
    /// Extra headers such as `Content-ID`.
    pub headers: Headers,
}

impl Leaf {
    /// Creates a text leaf.
    #[must_use]
    pub fn text(content_type: ContentType, text: impl Into<String>) -> Self {
        Self {
            content_type,
            body: LeafBody::Text(text.into()),
            file_name: None,
            headers: Headers::new(),
        }
    }

    /// Creates a binary leaf.
    #[must_use]
    pub fn binary(content_type: ContentType, data: Bytes) -> Self {
        Self {
            content_type,
            body: LeafBody::Binary(data),
            file_name: None,
            headers: Headers::new(),
        }
    }

    /// Returns the text payload, if this is a text leaf.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            LeafBody::Text(text) => Some(text),
            LeafBody::Binary(_) => None,
        }
    }

    /// Returns the charset, if any.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.content_type.charset()
    }

    /// Returns the `Content-ID` header, if any.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.headers.get("Content-ID")
    }
}

/// A multipart container. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    kind: MultipartKind,
    children: Vec<MimeNode>,
}

impl Container {
    /// Creates a container holding `first` as its only child.
    #[must_use]
    pub fn new(kind: MultipartKind, first: MimeNode) -> Self {
        Self {
            kind,
            children: vec![first],
        }
    }

    /// Appends a child.
    pub fn push(&mut self, child: MimeNode) {
        self.children.push(child);
    }

    /// Returns the container kind.
    #[must_use]
    pub const fn kind(&self) -> MultipartKind {
        self.kind
    }

    /// Returns the children in order.
    #[must_use]
    pub fn children(&self) -> &[MimeNode] {
        &self.children
    }
}

/// A node of the composed message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeNode {
    /// Single part.
    Leaf(Leaf),
    /// Multipart container.
    Container(Container),
}

impl MimeNode {
    /// Returns true for leaves.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Returns the leaf, if this is one.
    #[must_use]
    pub const fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Container(_) => None,
        }
    }

    /// Returns the container, if this is one.
    #[must_use]
    pub const fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Container(container) => Some(container),
            Self::Leaf(_) => None,
        }
    }

    /// Returns the container kind, if this is a container.
    #[must_use]
    pub fn kind(&self) -> Option<MultipartKind> {
        self.as_container().map(Container::kind)
    }

    /// Returns the children of a container, or an empty slice for a leaf.
    #[must_use]
    pub fn children(&self) -> &[MimeNode] {
        match self {
            Self::Container(container) => container.children(),
            Self::Leaf(_) => &[],
        }
    }

    /// Returns the text of a text leaf.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.as_leaf().and_then(Leaf::as_text)
    }

    /// Returns the charset of a leaf.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.as_leaf().and_then(Leaf::charset)
    }

    /// Returns the `Content-ID` of a leaf.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.as_leaf().and_then(Leaf::content_id)
    }
}

impl From<Leaf> for MimeNode {
    fn from(leaf: Leaf) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<Container> for MimeNode {
    fn from(container: Container) -> Self {
        Self::Container(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_is_never_empty() {
        let leaf = Leaf::text(ContentType::text_plain("utf-8"), "hi");
        let mut container = Container::new(MultipartKind::Mixed, leaf.into());
        assert_eq!(container.children().len(), 1);
        container.push(Leaf::binary(ContentType::octet_stream(), Bytes::new()).into());
        assert_eq!(container.children().len(), 2);
    }

    #[test]
    fn test_node_accessors() {
        let mut image = Leaf::binary(ContentType::new("image", "png"), Bytes::from_static(b"png"));
        image.headers.add("Content-ID", "<logo>");
        let node = MimeNode::from(image);
        assert!(node.is_leaf());
        assert_eq!(node.content_id(), Some("<logo>"));
        assert_eq!(node.charset(), None);
        assert_eq!(node.text(), None);
        assert!(node.children().is_empty());
        assert_eq!(node.kind(), None);
    }

    #[test]
    fn test_subtypes() {
        assert_eq!(MultipartKind::Mixed.subtype(), "mixed");
        assert_eq!(MultipartKind::Alternative.subtype(), "alternative");
        assert_eq!(MultipartKind::Related.subtype(), "related");
    }
}
