//! PropertySet Schema CLI
//!
//! Command-line interface for generating API documents from model files.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use propertyset_schema::{
    emit, lint, load_model_auto, validate_document, Direction, DocumentAssembler, FileStatus,
    Format, Info, ResolutionContext, ResolveOptions, Resolver, Schema, SchemaMap, Severity,
    SpecVersion, TypeDescriptor, ValidateError,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "propertyset-schema")]
#[command(about = "Generate Swagger/OpenAPI documents from property set models")]
#[command(version)]
struct Cli {
    /// Enable verbose logging on stderr. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the API document described by a model file
    Generate {
        /// Model source: file path or URL (http:// or https://)
        model: String,

        /// Document layout: v2 (Swagger 2.0) or v3 (OpenAPI 3.0)
        #[arg(long, default_value = "v3")]
        spec: String,

        /// Output format: json or yaml
        #[arg(long, default_value = "json")]
        format: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Document title when the model's API has none
        #[arg(long)]
        title: Option<String>,

        /// Document version when the model's API has none
        #[arg(long)]
        api_version: Option<String>,

        /// Skip operations referring to unknown or ambiguous property sets
        #[arg(long)]
        skip_unresolved: bool,

        /// Check the generated document for dangling references before writing it
        #[arg(long)]
        check: bool,
    },

    /// Resolve the schema of one property set
    Resolve {
        /// Model source: file path or URL (http:// or https://)
        model: String,

        /// Name of the property set to resolve
        #[arg(long)]
        set: String,

        /// Resolve for request direction
        #[arg(
            long,
            conflicts_with = "response",
            required_unless_present = "response"
        )]
        request: bool,

        /// Resolve for response direction
        #[arg(long, conflicts_with = "request", required_unless_present = "request")]
        response: bool,

        /// Publish the set as a named schema under this model name
        #[arg(long)]
        model_name: Option<String>,

        /// Reference layout: v2 (Swagger 2.0) or v3 (OpenAPI 3.0)
        #[arg(long, default_value = "v3")]
        spec: String,

        /// Output format: json or yaml
        #[arg(long, default_value = "json")]
        format: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Lint model files for errors (syntax, duplicate names, broken references)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v flags.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Generate {
            model,
            spec,
            format,
            pretty,
            output,
            title,
            api_version,
            skip_unresolved,
            check,
        } => run_generate(GenerateArgs {
            model,
            spec,
            format,
            pretty,
            output,
            title,
            api_version,
            skip_unresolved,
            check,
        }),

        Commands::Resolve {
            model,
            set,
            request,
            response: _,
            model_name,
            spec,
            format,
            pretty,
        } => run_resolve(ResolveArgs {
            model,
            set,
            request,
            model_name,
            spec,
            format,
            pretty,
        }),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn parse_spec(spec: &str) -> Result<SpecVersion, u8> {
    SpecVersion::parse(spec).ok_or_else(|| {
        eprintln!("Error: unknown spec version \"{}\": expected v2 or v3", spec);
        2u8
    })
}

fn parse_format(format: &str) -> Result<Format, u8> {
    Format::parse(format).ok_or_else(|| {
        eprintln!("Error: unknown format \"{}\": expected json or yaml", format);
        2u8
    })
}

struct GenerateArgs {
    model: String,
    spec: String,
    format: String,
    pretty: bool,
    output: Option<PathBuf>,
    title: Option<String>,
    api_version: Option<String>,
    skip_unresolved: bool,
    check: bool,
}

fn run_generate(args: GenerateArgs) -> Result<(), u8> {
    let spec_version = parse_spec(&args.spec)?;
    let format = parse_format(&args.format)?;

    let model = load_model_auto(&args.model).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mut options = ResolveOptions::new(spec_version).skip_unresolved(args.skip_unresolved);
    if let Some(title) = args.title {
        options = options.title(title);
    }
    if let Some(version) = args.api_version {
        options = options.version(version);
    }

    let document = DocumentAssembler::new(&model.catalog, options)
        .with_localizer(&model.messages)
        .generate(&model.api)
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    if args.check {
        match validate_document(&document) {
            Ok(()) => {}
            Err(ValidateError::Invalid { issues }) => {
                eprintln!("Document check failed:");
                for issue in issues {
                    eprintln!("  {}", issue);
                }
                return Err(1);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return Err(e.exit_code() as u8);
            }
        }
    }

    let rendered = emit(&document, format, args.pretty).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    write_output(args.output.as_deref(), &rendered)
}

struct ResolveArgs {
    model: String,
    set: String,
    request: bool,
    model_name: Option<String>,
    spec: String,
    format: String,
    pretty: bool,
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    schema: &'a Schema,
    definitions: &'a SchemaMap,
}

fn run_resolve(args: ResolveArgs) -> Result<(), u8> {
    let spec_version = parse_spec(&args.spec)?;
    let format = parse_format(&args.format)?;
    let direction = Direction::from_request_flag(args.request);

    let model = load_model_auto(&args.model).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let options = ResolveOptions::new(spec_version);
    let stub = propertyset_schema::Document::new(
        spec_version,
        Info {
            title: options.title.clone(),
            version: options.version.clone(),
            description: None,
        },
    );
    let mut context = ResolutionContext::open(stub);
    let schema = Resolver::new(&model.catalog, &mut context)
        .with_localizer(&model.messages)
        .resolve_type(
            &TypeDescriptor::declared(args.set.as_str()),
            direction,
            args.model_name.as_deref(),
        )
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
    context.merge();
    let document = context.close();

    let output = ResolveOutput {
        schema: &schema,
        definitions: document.definitions(),
    };
    let rendered = emit(&output, format, args.pretty).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    write_output(None, &rendered)
}

fn write_output(path: Option<&Path>, content: &str) -> Result<(), u8> {
    match path {
        Some(path) => {
            std::fs::write(path, content).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", content.trim_end());
        }
    }
    Ok(())
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let rendered = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", rendered);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
