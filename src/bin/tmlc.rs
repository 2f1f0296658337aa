//! tmlc - TML Layout Compiler CLI
//!
//! Commands: compile, inspect
//! Returns non-zero on any fatal error; exit code 2 marks a source
//! validation failure, 1 an I/O or toolchain failure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use tmlc_core::{
    decode, package_object, pipeline, CompileError, CompileOptions, PackageOptions,
    UnknownValuePolicy,
};

#[derive(Parser)]
#[command(name = "tmlc")]
#[command(about = "TML Layout Compiler - layout scripts to firmware display binaries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a TML source file into a binary layout artifact
    Compile {
        /// TML source path
        input: PathBuf,

        /// Output artifact path
        #[arg(short, long, default_value = "layout.bin")]
        output: PathBuf,

        /// Reject unrecognized color/keyword values instead of passing
        /// them through with a warning
        #[arg(long)]
        strict: bool,

        /// Print the compile report as JSON
        #[arg(long)]
        json: bool,

        /// Also write the compile report to this path as JSON
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Also wrap the artifact into a relocatable object at this path
        #[arg(long)]
        pack: Option<PathBuf>,

        /// objcopy-compatible tool used with --pack
        #[arg(long, default_value = "arm-none-eabi-objcopy")]
        objcopy: String,

        /// Symbol stem for --pack (default: artifact file stem)
        #[arg(long)]
        symbols: Option<String>,
    },

    /// Decode an artifact and print its descriptor table
    Inspect {
        /// Artifact path
        artifact: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            strict,
            json,
            manifest,
            pack,
            objcopy,
            symbols,
        } => {
            let options = CompileOptions {
                unknown_values: if strict {
                    UnknownValuePolicy::Reject
                } else {
                    UnknownValuePolicy::PassThrough
                },
            };

            let report = match pipeline::compile_file(&input, &output, &options) {
                Ok(r) => r,
                Err(e) => return fail(&e, json),
            };

            if let Some(path) = manifest {
                let body = match serde_json::to_string_pretty(&report) {
                    Ok(b) => b,
                    Err(e) => {
                        eprintln!("error: cannot serialize report: {e}");
                        return ExitCode::FAILURE;
                    }
                };
                if let Err(source) = std::fs::write(&path, body) {
                    return fail(&CompileError::Serialization { source }, json);
                }
            }

            if let Some(object) = pack {
                let package_options = PackageOptions {
                    tool: objcopy,
                    symbol_stem: symbols,
                    ..Default::default()
                };
                if let Err(e) = package_object(&output, &object, &package_options) {
                    return fail(&e, json);
                }
            }

            if json {
                let body = serde_json::json!({ "success": true, "report": report });
                println!("{}", serde_json::to_string_pretty(&body).unwrap());
            } else {
                println!(
                    "{}: {} layouts, {} content bytes, sha256 {}",
                    output.display(),
                    report.layout_count,
                    report.content_size,
                    report.artifact_sha256
                );
                for warning in &report.warnings {
                    eprintln!(
                        "warning: unrecognized {} value {:?} passed through",
                        warning.attribute, warning.value
                    );
                }
            }
            ExitCode::SUCCESS
        }

        Commands::Inspect { artifact, json } => {
            let bytes = match std::fs::read(&artifact) {
                Ok(b) => b,
                Err(source) => {
                    return fail(
                        &CompileError::SourceNotFound {
                            path: artifact,
                            source,
                        },
                        json,
                    );
                }
            };
            let decoded = match decode(&bytes) {
                Ok(d) => d,
                Err(e) => return fail(&e, json),
            };

            if json {
                let body = serde_json::json!({
                    "content_size": decoded.content.len(),
                    "layout_count": decoded.table.len(),
                    "content": String::from_utf8_lossy(&decoded.content),
                    "table": decoded.table,
                });
                println!("{}", serde_json::to_string_pretty(&body).unwrap());
            } else {
                println!(
                    "content: {} bytes, {} layouts",
                    decoded.content.len(),
                    decoded.table.len()
                );
                for (i, entry) in decoded.table.iter().enumerate() {
                    println!(
                        "[{i}] hash 0x{:08X} offset {} size {} areas {} placeholders {}",
                        entry.id_hash,
                        entry.offset,
                        entry.size,
                        entry.area_count,
                        entry.placeholders.len()
                    );
                    for ph in &entry.placeholders {
                        println!("      ${} @ {} (len {})", ph.name, ph.offset, ph.length);
                    }
                }
            }
            ExitCode::SUCCESS
        }
    }
}

fn fail(error: &CompileError, json: bool) -> ExitCode {
    if json {
        let body = serde_json::json!({ "success": false, "error": error.to_string() });
        println!("{}", serde_json::to_string(&body).unwrap());
    } else {
        eprintln!("error: {error}");
    }
    match error {
        CompileError::SourceNotFound { .. }
        | CompileError::Serialization { .. }
        | CompileError::Packaging { .. }
        | CompileError::MalformedArtifact(_) => ExitCode::FAILURE,
        _ => ExitCode::from(2), // source validation failure
    }
}
