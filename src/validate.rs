//! Identifier Validator - Document-Wide Uniqueness
//!
//! Scans every `id:` declaration in the normalized text and rejects the
//! document when any value repeats. All duplicated values are collected
//! first so the author sees the complete list in one pass.

use crate::error::{CompileError, Result};
use crate::parse::scan_id_declarations;

/// Check that all `id:` values across the document are unique
/// (case-sensitive, exact match).
pub fn check_unique_ids(content: &str) -> Result<()> {
    let decls = scan_id_declarations(content);
    let mut duplicates: Vec<String> = Vec::new();

    for (i, decl) in decls.iter().enumerate() {
        let repeated = decls[..i].iter().any(|d| d.name == decl.name);
        if repeated && !duplicates.contains(&decl.name) {
            duplicates.push(decl.name.clone());
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(CompileError::DuplicateId { ids: duplicates })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids_pass() {
        assert!(check_unique_ids("id:root\nid:screen1\nid:screen2").is_ok());
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = check_unique_ids("id:main\nid:other\nid:main").unwrap_err();
        match err {
            CompileError::DuplicateId { ids } => assert_eq!(ids, ["main"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_all_duplicates_listed_once() {
        let err = check_unique_ids("id:a\nid:b\nid:a\nid:b\nid:a").unwrap_err();
        match err {
            CompileError::DuplicateId { ids } => assert_eq!(ids, ["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_case_sensitive() {
        assert!(check_unique_ids("id:Main\nid:main").is_ok());
    }
}
