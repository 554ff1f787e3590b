use crate::descriptor::ToolDescriptor;
use crate::error::ToolFailure;
use crate::validation::ValidatedArguments;
use async_trait::async_trait;

/// A single piece of tool output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Text(String),
    File {
        name: String,
        mime_type: String,
        payload: Vec<u8>,
    },
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text(text.into())
    }

    pub fn file(name: impl Into<String>, mime_type: impl Into<String>, payload: Vec<u8>) -> Self {
        ContentItem::File {
            name: name.into(),
            mime_type: mime_type.into(),
            payload,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentItem::Text(_))
    }
}

/// Ordered, non-empty output of a tool invocation.
///
/// There is no way to build an empty `ToolResult`, so every encoded result
/// carries at least one content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    items: Vec<ContentItem>,
}

impl ToolResult {
    pub fn new(first: ContentItem) -> Self {
        Self { items: vec![first] }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ContentItem::text(text))
    }

    /// Build from a vector, returning `None` when it is empty.
    pub fn from_items(items: Vec<ContentItem>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    #[must_use]
    pub fn with(mut self, item: ContentItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn first(&self) -> &ContentItem {
        &self.items[0]
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_items(self) -> Vec<ContentItem> {
        self.items
    }
}

/// An executable tool.
///
/// Implementations receive arguments that already passed validation against
/// the schema in [`Tool::descriptor`], so typed accessors on
/// [`ValidatedArguments`] can be relied upon for declared properties.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Describe the tool. Called once, at registration.
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool.
    async fn execute(&self, arguments: ValidatedArguments) -> Result<ToolResult, ToolFailure>;
}
