//! Layout Table Builder - Descriptor Construction
//!
//! One descriptor per addressable block: a synthesized entry for Root
//! first (offset 0, no areas), then the Layouts in document order. The
//! id hash is the firmware's lookup key.

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};
use crate::hashing::djb2_32;
use crate::parse::{Block, BlockTree};
use crate::placeholder::{scan_placeholders, Placeholder};

/// A single entry of the layout descriptor table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    /// 32-bit DJB2 hash of the block's id.
    pub id_hash: u32,
    /// Byte offset of the block's content range.
    pub offset: u32,
    /// Byte size of the block's content range.
    pub size: u32,
    /// Number of immediate Area children.
    pub area_count: u32,
    pub placeholders: Vec<Placeholder>,
}

/// Build the descriptor table from the block tree.
///
/// All structural and identifier validation has already passed by the
/// time this runs; the only remaining failure is a Root or Layout block
/// without an id, which would leave its descriptor unaddressable.
pub fn build_table(content: &str, tree: &BlockTree) -> Result<Vec<LayoutDescriptor>> {
    let mut table = Vec::with_capacity(tree.layouts.len() + 1);
    table.push(descriptor(content, &tree.root, 0)?);
    for layout in &tree.layouts {
        table.push(descriptor(content, layout, layout.areas.len() as u32)?);
    }
    Ok(table)
}

fn descriptor(content: &str, block: &Block, area_count: u32) -> Result<LayoutDescriptor> {
    let id = block
        .id
        .as_deref()
        .ok_or(CompileError::MissingId { kind: block.kind })?;
    Ok(LayoutDescriptor {
        id_hash: djb2_32(id),
        offset: block.span.start as u32,
        size: (block.span.end - block.span.start) as u32,
        area_count,
        placeholders: scan_placeholders(content, block.span.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_blocks;

    const DOC: &str = "Root{\nid:root\n}\nLayout{\nid:screen1\ntext:Hi $name\n}\nLayout{\nid:screen2\nArea{\ncolor:0xF800\n}\nArea{\ncolor:0x07E0\n}\n}";

    #[test]
    fn test_root_entry_first() {
        let tree = parse_blocks(DOC).unwrap();
        let table = build_table(DOC, &tree).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].id_hash, djb2_32("root"));
        assert_eq!(table[0].offset, 0);
        assert_eq!(table[0].area_count, 0);
        assert_eq!(table[0].size, tree.layouts[0].span.start as u32);
    }

    #[test]
    fn test_layout_entries() {
        let tree = parse_blocks(DOC).unwrap();
        let table = build_table(DOC, &tree).unwrap();
        assert_eq!(table[1].id_hash, djb2_32("screen1"));
        assert_eq!(table[1].placeholders.len(), 1);
        assert_eq!(table[1].placeholders[0].name, "name");
        assert_eq!(table[2].id_hash, djb2_32("screen2"));
        assert_eq!(table[2].area_count, 2);
        assert!(table[2].placeholders.is_empty());
    }

    #[test]
    fn test_ranges_do_not_overlap() {
        let tree = parse_blocks(DOC).unwrap();
        let table = build_table(DOC, &tree).unwrap();
        for pair in table.windows(2) {
            assert_eq!(pair[0].offset + pair[0].size, pair[1].offset);
        }
        let last = table.last().unwrap();
        assert_eq!((last.offset + last.size) as usize, DOC.len());
    }

    #[test]
    fn test_layout_without_id_rejected() {
        let doc = "Root{\nid:root\n}\nLayout{\ntext:orphan\n}";
        let tree = parse_blocks(doc).unwrap();
        let err = build_table(doc, &tree).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingId {
                kind: crate::parse::BlockKind::Layout
            }
        ));
    }
}
