//! Compilation Pipeline - Single Entry Point
//!
//! Strictly forward stages: normalize, parse, validate ids, build the
//! descriptor table, serialize. The first failure aborts everything and
//! no file is written. Two compiles of the same source produce
//! byte-identical artifacts.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::emit::{encode, write_artifact};
use crate::error::{CompileError, Result};
use crate::hashing::sha256_hex;
use crate::normalize::{normalize, UnknownValue, UnknownValuePolicy};
use crate::parse::parse_blocks;
use crate::table::{build_table, LayoutDescriptor};
use crate::validate::check_unique_ids;
use crate::COMPILER_VERSION;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CompileOptions {
    /// What to do with color names and keywords outside the known tables.
    pub unknown_values: UnknownValuePolicy,
}

/// A fully compiled document, in memory.
#[derive(Debug, Clone)]
pub struct CompiledLayout {
    /// The artifact blob, ready to write.
    pub artifact: Vec<u8>,
    /// Normalized content, serialized verbatim inside the artifact.
    pub content: String,
    /// Descriptor table: Root entry first, then Layouts in document order.
    pub table: Vec<LayoutDescriptor>,
    /// Values passed through verbatim under the pass-through policy.
    pub warnings: Vec<UnknownValue>,
}

/// Summary of a compile, serializable for tooling.
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub compiler_version: String,
    pub content_size: u32,
    pub layout_count: u32,
    pub artifact_sha256: String,
    pub warnings: Vec<UnknownValue>,
    pub table: Vec<LayoutDescriptor>,
}

/// Compile TML source text into an artifact. Pure; touches no files.
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<CompiledLayout> {
    let normalized = normalize(source);
    if options.unknown_values == UnknownValuePolicy::Reject {
        if let Some(unknown) = normalized.unknown_values.first() {
            return Err(CompileError::UnknownValue {
                attribute: unknown.attribute.clone(),
                value: unknown.value.clone(),
            });
        }
    }

    let tree = parse_blocks(&normalized.text)?;
    check_unique_ids(&normalized.text)?;
    let table = build_table(&normalized.text, &tree)?;
    let artifact = encode(normalized.text.as_bytes(), &table);

    Ok(CompiledLayout {
        artifact,
        content: normalized.text,
        table,
        warnings: normalized.unknown_values,
    })
}

/// Compile a source file and write the artifact atomically.
pub fn compile_file(input: &Path, output: &Path, options: &CompileOptions) -> Result<CompileReport> {
    let source = fs::read_to_string(input).map_err(|source| CompileError::SourceNotFound {
        path: input.to_path_buf(),
        source,
    })?;
    let compiled = compile_source(&source, options)?;
    write_artifact(output, &compiled.artifact)?;
    Ok(report(&compiled))
}

/// Build the serializable report for a compiled document.
pub fn report(compiled: &CompiledLayout) -> CompileReport {
    CompileReport {
        compiler_version: COMPILER_VERSION.to_string(),
        content_size: compiled.content.len() as u32,
        layout_count: compiled.table.len() as u32,
        artifact_sha256: sha256_hex(&compiled.artifact),
        warnings: compiled.warnings.clone(),
        table: compiled.table.clone(),
    }
}
