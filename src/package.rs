//! Object Packaging - External Toolchain Boundary
//!
//! Wraps the binary artifact into a relocatable object exposing
//! `<stem>_start`, `<stem>_end` and `<stem>_size` symbols, by invoking an
//! objcopy-compatible tool. This runs after the artifact exists; on
//! failure the artifact is kept on disk for diagnosis.

use std::path::Path;
use std::process::Command;

use crate::error::{CompileError, Result};

/// How the artifact gets wrapped into a linkable object.
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// objcopy-compatible executable.
    pub tool: String,
    /// Output object format.
    pub output_format: String,
    /// Target architecture passed as `-B`.
    pub arch: String,
    /// Base name for the exported symbols; defaults to the artifact's
    /// file stem.
    pub symbol_stem: Option<String>,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            tool: "arm-none-eabi-objcopy".to_string(),
            output_format: "elf32-littlearm".to_string(),
            arch: "arm".to_string(),
            symbol_stem: None,
        }
    }
}

/// Package `artifact` into `object`.
pub fn package_object(artifact: &Path, object: &Path, options: &PackageOptions) -> Result<()> {
    let stem = match &options.symbol_stem {
        Some(s) => s.clone(),
        None => artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "layout".to_string()),
    };
    let mangled = mangle_symbol_base(&artifact.to_string_lossy());

    let mut cmd = Command::new(&options.tool);
    cmd.args(["-I", "binary", "-O", &options.output_format, "-B", &options.arch])
        .args(["--rename-section", ".data=.rodata"]);
    for suffix in ["start", "end", "size"] {
        cmd.arg("--redefine-sym")
            .arg(format!("{mangled}_{suffix}={stem}_{suffix}"));
    }
    cmd.arg(artifact).arg(object);

    let status = cmd.status().map_err(|e| CompileError::Packaging {
        tool: options.tool.clone(),
        reason: e.to_string(),
    })?;
    if !status.success() {
        return Err(CompileError::Packaging {
            tool: options.tool.clone(),
            reason: format!("exited with {status}"),
        });
    }
    Ok(())
}

/// The symbol base objcopy derives from the input path: `_binary_` plus
/// the path with every non-alphanumeric character replaced by `_`.
fn mangle_symbol_base(path: &str) -> String {
    let sanitized: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("_binary_{sanitized}")
}
