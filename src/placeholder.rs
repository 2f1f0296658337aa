//! Placeholder Scanner - `$name` Tokens
//!
//! Placeholders are resolved by the firmware at render time, so each one
//! is recorded with its absolute byte offset into the serialized content
//! and the byte length of the full token including `$`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::parse::is_ident_byte;

/// A `$name` token inside a block's content range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    /// Identifier without the `$` marker.
    pub name: String,
    /// Absolute byte position of the `$` within the content.
    pub offset: u32,
    /// Byte length of the full token including `$`.
    pub length: u32,
}

/// Scan one block's byte range for placeholder tokens.
///
/// A token is `$` followed by one or more `[A-Za-z0-9_]` bytes; a bare
/// `$` is ordinary text.
pub fn scan_placeholders(content: &str, span: Range<usize>) -> Vec<Placeholder> {
    let bytes = content.as_bytes();
    let mut found = Vec::new();
    let mut i = span.start;

    while i < span.end {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < span.end && is_ident_byte(bytes[j]) {
            j += 1;
        }
        if j > i + 1 {
            found.push(Placeholder {
                name: content[i + 1..j].to_string(),
                offset: i as u32,
                length: (j - i) as u32,
            });
        }
        i = j.max(i + 1);
    }

    found
}
