//! Smali to Swagger - command-line tool extracting a Swagger 2.0 document from decompiled
//! Android sources.
//!
//! The tool walks a directory of `.smali` files (as produced by `apktool d` or `baksmali`), finds
//! the HTTP client interfaces declared with Retrofit annotations, resolves the request and
//! response types through the decompiled model classes, and writes the resulting document.
//!
//! # Usage
//!
//! ```bash
//! smali-swagger [OPTIONS] [SMALI_DIR]
//! ```
//!
//! # Examples
//!
//! Write `swagger.json` for a decompiled app:
//! ```bash
//! smali-swagger ./app-decompiled/smali
//! ```
//!
//! Write YAML to stdout with debug logging:
//! ```bash
//! smali-swagger ./app-decompiled -f yaml -o - -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use smali_swagger::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Smali to Swagger starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Swagger extraction completed successfully");

    Ok(())
}
