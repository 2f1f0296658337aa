//! Block Parser - Structural Scan of Normalized Text
//!
//! Locates `Root{`, `Layout{` and `Area{` markers and assigns each block a
//! byte range into the normalized content. Layout ranges span from a
//! layout's own marker to the next layout marker (or end of document);
//! Area ranges come from brace-depth scanning inside their owning layout.
//!
//! Everything here works on byte offsets so descriptor offsets and
//! placeholder positions line up with the serialized content exactly.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Root,
    Layout,
    Area,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            Self::Layout => f.write_str("Layout"),
            Self::Area => f.write_str("Area"),
        }
    }
}

/// A parsed structural unit with its byte range into the content.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub id: Option<String>,
    pub span: Range<usize>,
    /// Immediate Area children; empty for Root and Area blocks.
    pub areas: Vec<Block>,
}

/// The full document structure: one Root, at least one Layout.
#[derive(Debug, Clone)]
pub struct BlockTree {
    pub root: Block,
    pub layouts: Vec<Block>,
}

/// An `id:` declaration found in the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdDecl {
    pub position: usize,
    pub name: String,
}

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Parse normalized text into the block tree.
pub fn parse_blocks(content: &str) -> Result<BlockTree> {
    if find_marker(content, "Root", 0).is_none() {
        return Err(CompileError::MissingStructure { marker: "Root" });
    }

    let mut layout_starts = Vec::new();
    let mut from = 0;
    while let Some(start) = find_marker(content, "Layout", from) {
        layout_starts.push(start);
        from = start + 1;
    }
    if layout_starts.is_empty() {
        return Err(CompileError::MissingStructure { marker: "Layout" });
    }

    let root_span = 0..layout_starts[0];
    let root = Block {
        kind: BlockKind::Root,
        id: block_id(content, root_span.clone(), &[]),
        span: root_span,
        areas: Vec::new(),
    };

    let mut layouts = Vec::with_capacity(layout_starts.len());
    for (i, &start) in layout_starts.iter().enumerate() {
        let end = layout_starts
            .get(i + 1)
            .copied()
            .unwrap_or_else(|| content.len());
        let span = start..end;
        let areas = find_areas(content, span.clone());
        let id = block_id(content, span.clone(), &areas);
        layouts.push(Block {
            kind: BlockKind::Layout,
            id,
            span,
            areas,
        });
    }

    Ok(BlockTree { root, layouts })
}

/// Find `name` followed by optional whitespace and `{`, at or after
/// `from`. The byte before `name` must not be an identifier byte, so
/// `SubLayout{` never matches `Layout`.
pub(crate) fn find_marker(content: &str, name: &str, from: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut i = from;
    while i < content.len() {
        let rel = content[i..].find(name)?;
        let start = i + rel;
        let end = start + name.len();
        let boundary = start == 0 || !is_ident_byte(bytes[start - 1]);
        let mut j = end;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if boundary && j < bytes.len() && bytes[j] == b'{' {
            return Some(start);
        }
        i = start + 1;
    }
    None
}

/// Depth-scan from the byte after an opening brace to the byte after its
/// matching close. Returns `limit` when the block never closes.
fn scan_block_end(content: &str, open: usize, limit: usize) -> usize {
    let bytes = content.as_bytes();
    let mut depth = 1u32;
    let mut i = open + 1;
    while i < limit {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    limit
}

/// Immediate Area blocks inside a span. Scanning resumes after each
/// area's closing brace, so an Area nested in another Area is not
/// counted twice.
fn find_areas(content: &str, span: Range<usize>) -> Vec<Block> {
    let mut areas = Vec::new();
    let mut from = span.start;
    while let Some(start) = find_marker(&content[..span.end], "Area", from) {
        let open = match content[start..span.end].find('{') {
            Some(rel) => start + rel,
            None => break,
        };
        let end = scan_block_end(content, open, span.end);
        let area_span = start..end;
        areas.push(Block {
            kind: BlockKind::Area,
            id: block_id(content, area_span.clone(), &[]),
            span: area_span,
            areas: Vec::new(),
        });
        from = end;
    }
    areas
}

/// The block's own `id:` value: the first declaration in its span that
/// does not belong to one of its Area children.
fn block_id(content: &str, span: Range<usize>, areas: &[Block]) -> Option<String> {
    scan_id_declarations(&content[span.clone()])
        .into_iter()
        .map(|decl| IdDecl {
            position: decl.position + span.start,
            name: decl.name,
        })
        .find(|decl| !areas.iter().any(|a| a.span.contains(&decl.position)))
        .map(|decl| decl.name)
}

/// Every `id:` declaration in the given text, in document order.
pub fn scan_id_declarations(content: &str) -> Vec<IdDecl> {
    let bytes = content.as_bytes();
    let mut decls = Vec::new();
    let mut i = 0;
    while i < content.len() {
        let rel = match content[i..].find("id") {
            Some(r) => r,
            None => break,
        };
        let start = i + rel;
        i = start + 1;

        // `grid:` and `$id:` are not declarations.
        if start > 0 {
            let prev = bytes[start - 1];
            if is_ident_byte(prev) || prev == b'$' {
                continue;
            }
        }
        let mut j = start + 2;
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b':' {
            continue;
        }
        j += 1;
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
        let value_start = j;
        while j < bytes.len() && is_ident_byte(bytes[j]) {
            j += 1;
        }
        if j == value_start {
            continue;
        }
        decls.push(IdDecl {
            position: start,
            name: content[value_start..j].to_string(),
        });
        i = j;
    }
    decls
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Root{\nid:root\ncolor:0xFFFF\n}\nLayout{\nid:screen1\ntext:Hello $name\n}\nLayout{\nid:screen2\nArea{\ncolor:0xF800\n}\nArea{\ncolor:0x07E0\n}\n}";

    #[test]
    fn test_tree_structure() {
        let tree = parse_blocks(DOC).unwrap();
        assert_eq!(tree.root.id.as_deref(), Some("root"));
        assert_eq!(tree.layouts.len(), 2);
        assert_eq!(tree.layouts[0].id.as_deref(), Some("screen1"));
        assert_eq!(tree.layouts[1].id.as_deref(), Some("screen2"));
        assert_eq!(tree.layouts[0].areas.len(), 0);
        assert_eq!(tree.layouts[1].areas.len(), 2);
    }

    #[test]
    fn test_spans_tile_content() {
        let tree = parse_blocks(DOC).unwrap();
        assert_eq!(tree.root.span.start, 0);
        assert_eq!(tree.root.span.end, tree.layouts[0].span.start);
        assert_eq!(tree.layouts[0].span.end, tree.layouts[1].span.start);
        assert_eq!(tree.layouts[1].span.end, DOC.len());
    }

    #[test]
    fn test_missing_root() {
        let err = parse_blocks("Layout{\nid:a\n}").unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingStructure { marker: "Root" }
        ));
    }

    #[test]
    fn test_missing_layout() {
        let err = parse_blocks("Root{\nid:root\n}").unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingStructure { marker: "Layout" }
        ));
        assert!(matches!(
            parse_blocks("").unwrap_err(),
            CompileError::MissingStructure { marker: "Root" }
        ));
    }

    #[test]
    fn test_marker_word_boundary() {
        assert_eq!(find_marker("SubLayout{", "Layout", 0), None);
        assert_eq!(find_marker("Layout{", "Layout", 0), Some(0));
        assert_eq!(find_marker("Layout\n{", "Layout", 0), Some(0));
    }

    #[test]
    fn test_id_scan() {
        let decls = scan_id_declarations("id:root\ngrid:5\n$id:x\nid:main");
        let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["root", "main"]);
        assert_eq!(decls[0].position, 0);
    }

    #[test]
    fn test_layout_id_skips_area_ids() {
        let doc = "Root{id:root}Layout{Area{id:badge}id:screen}";
        let tree = parse_blocks(doc).unwrap();
        assert_eq!(tree.layouts[0].id.as_deref(), Some("screen"));
    }
}
