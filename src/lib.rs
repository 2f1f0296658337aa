//! TML Compiler Core - Layout Scripts to Firmware Binaries
//!
//! Compiles a TML document (one Root block, one or more Layout blocks
//! with nested Area blocks) into the binary layout blob the display
//! firmware links in and parses at runtime.
//!
//! # Guarantees (Non-Negotiable)
//! 1. Fail fast: the first invalid stage aborts, nothing is written
//! 2. All-or-nothing output: no truncated or half-valid artifact ever
//!    reaches disk
//! 3. Deterministic: identical source yields byte-identical artifacts
//! 4. The wire format in [`emit`] is the firmware contract; field order,
//!    widths and endianness never vary

pub mod emit;
pub mod error;
pub mod hashing;
pub mod normalize;
pub mod package;
pub mod parse;
pub mod pipeline;
pub mod placeholder;
pub mod table;
pub mod validate;

pub use emit::{decode, encode, write_artifact, Artifact, CONTENT_ALIGN, HEADER_SIZE};
pub use error::{CompileError, Result};
pub use hashing::{djb2_32, sha256_hex};
pub use normalize::{normalize, Normalized, UnknownValue, UnknownValuePolicy};
pub use package::{package_object, PackageOptions};
pub use parse::{parse_blocks, Block, BlockKind, BlockTree};
pub use pipeline::{compile_file, compile_source, CompileOptions, CompileReport, CompiledLayout};
pub use placeholder::{scan_placeholders, Placeholder};
pub use table::{build_table, LayoutDescriptor};
pub use validate::check_unique_ids;

pub const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");
