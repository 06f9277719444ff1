use crate::serializer::OutputFormat;
use crate::swagger_builder::{Info, SwaggerDocument};
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Output path meaning "write to stdout"
pub const STDOUT_PATH: &str = "-";

/// Smali to Swagger - Extract a Swagger 2.0 description of the HTTP APIs declared in a decompiled
/// Android application
#[derive(Parser, Debug)]
#[command(name = "smali-swagger")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Directory containing the .smali files (defaults to the current directory)
    #[arg(value_name = "SMALI_DIR")]
    pub smali_dir: Option<PathBuf>,

    /// Same as SMALI_DIR; takes precedence when both are given
    #[arg(long = "path", value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Output file path ("-" writes to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = "swagger.json")]
    pub output_path: PathBuf,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Title of the generated API
    #[arg(long, default_value = "Extracted API")]
    pub title: String,

    /// Version of the generated API
    #[arg(long = "api-version", default_value = "1.0.0")]
    pub api_version: String,

    /// Description of the generated API
    #[arg(long, default_value = "API extracted from Smali files")]
    pub description: String,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    /// Directory to scan: `--path`, else SMALI_DIR, else the current directory.
    pub fn root_dir(&self) -> PathBuf {
        self.path
            .clone()
            .or_else(|| self.smali_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn info(&self) -> Info {
        Info {
            title: self.title.clone(),
            version: self.api_version.clone(),
            description: self.description.clone(),
        }
    }

    fn writes_to_stdout(&self) -> bool {
        self.output_path.as_os_str() == STDOUT_PATH
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    let root = args.root_dir();
    if !root.exists() {
        anyhow::bail!("Smali directory does not exist: {}", root.display());
    }
    if !root.is_dir() {
        anyhow::bail!("Smali directory is not a directory: {}", root.display());
    }

    info!("Smali directory: {}", root.display());
    info!("Output format: {:?}", args.output_format);
    if args.writes_to_stdout() {
        info!("Output: stdout");
    } else {
        info!("Output file: {}", args.output_path.display());
    }

    Ok(args)
}

/// Runs the whole pipeline over a directory and returns the document.
///
/// Unreadable files are skipped with a warning. A directory without any smali file or without
/// any annotated endpoint still yields a (possibly empty) document.
///
/// # Errors
///
/// Fails when the directory cannot be scanned or a response type cannot be turned into a
/// definition reference.
pub fn generate(root: &Path, info: Info) -> Result<SwaggerDocument> {
    use crate::class_index::ClassIndex;
    use crate::extractor::retrofit::RetrofitExtractor;
    use crate::extractor::EndpointExtractor;
    use crate::parser::SmaliParser;
    use crate::scanner::FileScanner;
    use crate::swagger_builder::SwaggerBuilder;
    use crate::type_resolver::TypeResolver;

    // Step 1: Scan directory for smali files
    info!("Scanning {}...", root.display());
    let scan_result = FileScanner::new(root.to_path_buf()).scan()?;
    info!("Found {} smali files", scan_result.smali_files.len());
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }
    if scan_result.smali_files.is_empty() {
        warn!("No smali files found in {}", root.display());
    }

    // Step 2: Index classes and extract endpoints, one file at a time
    let extractor = RetrofitExtractor;
    let mut class_index = ClassIndex::new();
    let mut endpoints = Vec::new();
    let loaded = SmaliParser::parse_each(&scan_result.smali_files, |file| {
        class_index.add_file(&file);
        endpoints.extend(extractor.extract_file(&file));
    });
    info!(
        "Loaded {} files, indexed {} classes",
        loaded,
        class_index.len()
    );
    info!("Extracted {} endpoints", endpoints.len());
    if endpoints.is_empty() {
        warn!("No annotated HTTP endpoints found");
    }

    // Step 3: Build the document
    let mut resolver = TypeResolver::new(class_index);
    let mut builder = SwaggerBuilder::new().with_info(info);
    builder
        .add_endpoints(&endpoints, &mut resolver)
        .context("Failed to build Swagger document")?;
    let document = builder.build(resolver);
    info!(
        "Swagger document built: {} paths, {} definitions",
        document.paths.len(),
        document.definitions.len()
    );

    Ok(document)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::serializer::{serialize, write_to_file};

    info!("Starting Swagger extraction...");
    let document = generate(&args.root_dir(), args.info())?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = serialize(&document, args.output_format)?;

    if args.writes_to_stdout() {
        println!("{}", content);
    } else {
        info!("Writing output to: {}", args.output_path.display());
        write_to_file(&content, &args.output_path)?;
        info!(
            "Successfully wrote Swagger document to {}",
            args.output_path.display()
        );
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Paths: {}", document.paths.len());
    info!("  - Definitions: {}", document.definitions.len());

    Ok(())
}
