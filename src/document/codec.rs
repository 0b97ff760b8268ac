//! JSON interchange codec for [`Document`].
//!
//! The blob is a pretty-printed JSON array of file records. Field order is
//! fixed by the struct definitions and `Vec` order is preserved, so encoding
//! is deterministic and `decode(encode(d)) == d`.

use crate::document::Document;
use crate::error::{DecodeFailure, ParserError, Result};

/// Serializes a document into an interchange blob.
pub fn encode(doc: &Document) -> Result<Vec<u8>> {
    doc.validate().map_err(ParserError::EncodeFailed)?;

    let mut bytes =
        serde_json::to_vec_pretty(doc).map_err(|e| ParserError::EncodeFailed(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Deserializes an interchange blob.
///
/// Malformed bytes and well-formed JSON of the wrong shape are reported as
/// distinct [`DecodeFailure`] kinds.
pub fn decode(bytes: &[u8]) -> Result<Document> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| ParserError::DecodeFailed {
            kind: DecodeFailure::Unreadable,
            message: e.to_string(),
        })?;

    let doc: Document = serde_json::from_value(value).map_err(|e| invalid_shape(e.to_string()))?;
    doc.validate().map_err(invalid_shape)?;

    Ok(doc)
}

fn invalid_shape(message: String) -> ParserError {
    ParserError::DecodeFailed {
        kind: DecodeFailure::InvalidShape,
        message,
    }
}
