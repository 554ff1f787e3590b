//! Transport-neutral encoding of tool output
//!
//! Text items map to `{"type":"text","text":...}`. File items map to
//! `{"type":"file","file":{"name","mimeType","content","encoding":"base64"}}`
//! where `content` is the standard, padded base64 form of the payload.

use crate::error::ContentError;
use crate::tool::{ContentItem, ToolResult};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

/// The only file encoding produced.
pub const BASE64_ENCODING: &str = "base64";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedFile {
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub content: String,
    pub encoding: String,
}

impl EncodedFile {
    /// Recover the raw payload.
    pub fn decode(&self) -> Result<Vec<u8>, ContentError> {
        if self.encoding != BASE64_ENCODING {
            return Err(ContentError::UnsupportedEncoding(self.encoding.clone()));
        }
        Ok(BASE64.decode(&self.content)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EncodedContent {
    Text { text: String },
    File { file: EncodedFile },
}

impl EncodedContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            EncodedContent::Text { text } => Some(text),
            EncodedContent::File { .. } => None,
        }
    }

    pub fn as_file(&self) -> Option<&EncodedFile> {
        match self {
            EncodedContent::File { file } => Some(file),
            EncodedContent::Text { .. } => None,
        }
    }
}

pub fn encode_item(item: &ContentItem) -> EncodedContent {
    match item {
        ContentItem::Text(text) => EncodedContent::Text { text: text.clone() },
        ContentItem::File {
            name,
            mime_type,
            payload,
        } => EncodedContent::File {
            file: EncodedFile {
                name: name.clone(),
                mime_type: mime_type.clone(),
                content: BASE64.encode(payload),
                encoding: BASE64_ENCODING.to_string(),
            },
        },
    }
}

/// Encode every item of `result`, preserving order.
pub fn encode(result: &ToolResult) -> Vec<EncodedContent> {
    result.items().iter().map(encode_item).collect()
}

/// Inverse of [`encode_item`].
pub fn decode_item(encoded: &EncodedContent) -> Result<ContentItem, ContentError> {
    match encoded {
        EncodedContent::Text { text } => Ok(ContentItem::Text(text.clone())),
        EncodedContent::File { file } => Ok(ContentItem::File {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            payload: file.decode()?,
        }),
    }
}
