// Command-line front end for inspecting and building OLE package blobs.
//
// Explicit subcommands with long-form options. Clap arguments are resolved
// into a flat `Options` value before any file is touched.

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::io::{self as file_io, IoError};
use crate::ole::{Content, OLE_MAX_SIZE, OleBlob, OleBlobBuilder, PackageCodec, PackageOptions};

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// OLE package blob inspector and builder.
#[derive(Parser, Debug)]
#[command(
    name = "olepack",
    version,
    about = "Inspect, extract and build OLE package blobs",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print results as JSON.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Classify a blob and print its fields.
    Info(InfoArgs),
    /// Write the embedded payload of a blob to a file.
    Extract(ExtractArgs),
    /// Build a new blob.
    #[command(subcommand)]
    Build(BuildCmd),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Blob file to inspect.
    #[arg(value_hint = ValueHint::FilePath)]
    blob: PathBuf,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Blob file to read.
    #[arg(value_hint = ValueHint::FilePath)]
    blob: PathBuf,

    /// Output file for the payload.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Subcommand, Debug)]
enum BuildCmd {
    /// Embed a file through the "Package" shell object.
    Package(BuildArgs),
    /// Link to an external file.
    Link(BuildArgs),
    /// Embed raw bytes as an opaque object.
    Other(BuildArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Input file (for `link`, the path to link to).
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output blob file.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Override the recorded file name.
    #[arg(long = "file-name")]
    file_name: Option<String>,

    /// Override the recorded file path.
    #[arg(long = "file-path")]
    file_path: Option<String>,

    /// Pretty name of the package.
    #[arg(long = "pretty-name")]
    pretty_name: Option<String>,

    /// Class name of the package.
    #[arg(long = "class-name")]
    class_name: Option<String>,

    /// Type name of the package.
    #[arg(long = "type-name")]
    type_name: Option<String>,

    /// Maximum blob size (supports K/M/G suffix).
    #[arg(long = "max-size", value_parser = parse_byte_size, default_value_t = OLE_MAX_SIZE)]
    max_size: u64,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Info,
    Extract,
    BuildPackage,
    BuildLink,
    BuildOther,
    Config,
}

#[derive(Debug, Default)]
struct Names {
    file_name: Option<String>,
    file_path: Option<String>,
    pretty_name: Option<String>,
    class_name: Option<String>,
    type_name: Option<String>,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    names: Names,
    package: PackageOptions,
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        input_file: None,
        output_file: None,
        names: Names::default(),
        package: PackageOptions::default(),
    };

    match cli.command {
        Cmd::Info(args) => {
            opts.command = Command::Info;
            opts.input_file = Some(args.blob);
        }
        Cmd::Extract(args) => {
            opts.command = Command::Extract;
            opts.input_file = Some(args.blob);
            opts.output_file = Some(args.output);
        }
        Cmd::Build(build) => {
            let (command, args) = match build {
                BuildCmd::Package(args) => (Command::BuildPackage, args),
                BuildCmd::Link(args) => (Command::BuildLink, args),
                BuildCmd::Other(args) => (Command::BuildOther, args),
            };
            opts.command = command;
            opts.input_file = Some(args.input);
            opts.output_file = Some(args.output);
            opts.names = Names {
                file_name: args.file_name,
                file_path: args.file_path,
                pretty_name: args.pretty_name,
                class_name: args.class_name,
                type_name: args.type_name,
            };
            opts.package = PackageOptions {
                max_size: args.max_size,
            };
        }
        Cmd::Config => {}
    }

    opts
}

/// Parse `args` without running anything. Used by the argument fuzzer.
#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("olepack".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("olepack version {version} (Rust)");

    let file_io = cfg!(feature = "file-io") as u8;
    let defaults = PackageOptions::default();

    eprintln!("FILE_IO={file_io}");
    eprintln!("OLE_MAX_SIZE={}", defaults.max_size);
    eprintln!("sizeof(usize)={}", std::mem::size_of::<usize>());

    0
}

/// Refuse to clobber an existing output unless `-f` was given.
fn check_output(opts: &Options, path: &Path) -> Result<(), String> {
    if !opts.force && path.exists() {
        return Err(format!(
            "to overwrite output file specify -f: {}",
            path.display()
        ));
    }
    Ok(())
}

fn load_blob(path: &Path) -> Result<OleBlob, IoError> {
    file_io::read_blob_file(path, &PackageCodec::default())
}

fn content_json(blob: &OleBlob, content: &Content) -> serde_json::Value {
    let mut json = serde_json::json!({
        "type": content.content_type().as_str(),
        "size": blob.len().unwrap_or(0),
    });
    if let Some(p) = content.package() {
        json["pretty_name"] = p.pretty_name.clone().into();
        json["class_name"] = p.class_name.clone().into();
        json["type_name"] = p.type_name.clone().into();
    }
    match content {
        Content::Link(c) => {
            json["file_name"] = c.file_name.clone().into();
            json["file_path"] = c.file_path.clone().into();
            json["link_path"] = c.link_path.clone().into();
        }
        Content::SimplePackage(c) => {
            json["file_name"] = c.file_name.clone().into();
            json["file_path"] = c.file_path.clone().into();
            json["local_file_path"] = c.local_file_path.clone().into();
        }
        Content::CompoundStorage(c) => {
            json["entries"] = c.storage.entry_names().into();
        }
        _ => {}
    }
    if let Some(r) = content.range() {
        json["payload_position"] = r.position.into();
        json["payload_length"] = r.length.into();
    }
    json
}

fn cmd_info(opts: &Options) -> i32 {
    let Some(path) = opts.input_file.as_deref() else {
        eprintln!("olepack: info: missing blob file");
        return 1;
    };
    let blob = match load_blob(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("olepack: {}: {e}", path.display());
            return 1;
        }
    };
    let content = match blob.content() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("olepack: {}: {e}", path.display());
            return 1;
        }
    };

    if opts.json_output {
        println!("{:#}", content_json(&blob, content));
        return 0;
    }
    if opts.quiet {
        return 0;
    }

    println!("type:        {}", content.content_type());
    if let Some(p) = content.package() {
        println!("pretty name: {}", p.pretty_name);
        println!("class name:  {}", p.class_name);
        println!("type name:   {}", p.type_name);
    }
    match content {
        Content::Link(c) => {
            println!("file name:   {}", c.file_name);
            println!("file path:   {}", c.file_path);
            println!("link path:   {}", c.link_path);
        }
        Content::SimplePackage(c) => {
            println!("file name:   {}", c.file_name);
            println!("file path:   {}", c.file_path);
            println!("local path:  {}", c.local_file_path);
        }
        _ => {}
    }
    if let Some(r) = content.range() {
        println!("payload:     {} bytes at {}", r.length, r.position);
    }
    if opts.verbose > 0 {
        eprintln!("olepack: {blob}");
    }
    0
}

fn cmd_extract(opts: &Options) -> i32 {
    let (Some(input), Some(output)) = (opts.input_file.as_deref(), opts.output_file.as_deref())
    else {
        eprintln!("olepack: extract: missing blob or output file");
        return 1;
    };
    if let Err(msg) = check_output(opts, output) {
        eprintln!("olepack: {msg}");
        return 1;
    }

    let stats = match load_blob(input).and_then(|blob| file_io::extract_payload(&blob, output)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("olepack: {}: {e}", input.display());
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "olepack: extracted {} bytes from {} blob of {} bytes",
            stats.payload_size, stats.content_type, stats.blob_size
        );
    }
    if opts.json_output {
        let sha = stats
            .payload_sha256
            .map(|h| h.iter().map(|b| format!("{b:02x}")).collect::<String>());
        let json = serde_json::json!({
            "type": stats.content_type.as_str(),
            "blob_size": stats.blob_size,
            "payload_size": stats.payload_size,
            "payload_sha256": sha,
        });
        eprintln!("{json:#}");
    }
    0
}

fn builder_for(opts: &Options, input: &Path) -> Result<OleBlobBuilder, IoError> {
    let mut builder = match opts.command {
        Command::BuildPackage => file_io::simple_package_from_file(input)?,
        Command::BuildLink => file_io::link_from_file(input)?,
        _ => file_io::other_from_file(input)?,
    };

    let names = &opts.names;
    if let Some(v) = &names.file_name {
        builder = builder.file_name(v.clone());
    }
    if let Some(v) = &names.file_path {
        builder = builder.file_path(v.clone());
    }
    if let Some(v) = &names.pretty_name {
        builder = builder.pretty_name(v.clone());
    }
    if let Some(v) = &names.class_name {
        builder = builder.class_name(v.clone());
    }
    if let Some(v) = &names.type_name {
        builder = builder.type_name(v.clone());
    }
    Ok(builder)
}

fn cmd_build(opts: &Options) -> i32 {
    let (Some(input), Some(output)) = (opts.input_file.as_deref(), opts.output_file.as_deref())
    else {
        eprintln!("olepack: build: missing input or output file");
        return 1;
    };
    if let Err(msg) = check_output(opts, output) {
        eprintln!("olepack: {msg}");
        return 1;
    }

    let codec = PackageCodec::with_options(opts.package);
    let blob = match builder_for(opts, input).and_then(|b| codec.build(b).map_err(IoError::from)) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("olepack: {}: {e}", input.display());
            return 1;
        }
    };

    let written = blob
        .bytes()
        .map_err(IoError::from)
        .and_then(|bytes| std::fs::write(output, bytes).map_err(IoError::from));
    if let Err(e) = written {
        eprintln!("olepack: {}: {e}", output.display());
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        if let Err(e) = blob.content() {
            log::debug!("no content summary: {e}");
        }
        eprintln!("olepack: wrote {blob} to {}", output.display());
    }
    if opts.json_output {
        let json = serde_json::json!({
            "type": blob.content_type().map(|t| t.as_str()).unwrap_or("unknown"),
            "size": blob.len().unwrap_or(0),
        });
        eprintln!("{json:#}");
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    let default_filter = match opts.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Info => cmd_info(&opts),
        Command::Extract => cmd_extract(&opts),
        Command::BuildPackage | Command::BuildLink | Command::BuildOther => cmd_build(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
