// Command-line front end for bvdf.
//
// Decodes an appinfo.vdf file (or stdin) and presents it as JSON, a header
// summary, or an app listing.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use log::debug;

use crate::appinfo::{AppInfoRecord, DEFAULT_MAX_DEPTH, DecodeOptions, Document, EntryTree};
use crate::io::{self as bvdf_io, DecodeStats, IoError};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Steam binary VDF (appinfo.vdf) decoder.
#[derive(Parser, Debug)]
#[command(
    name = "bvdf",
    version,
    about = "Steam appinfo.vdf decoder",
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

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Decode and print the document as JSON.
    Dump(DumpArgs),
    /// Print the file header and record count.
    Header(InputArgs),
    /// List app ids, change numbers and names.
    Apps(InputArgs),
}

#[derive(Args, Debug)]
struct DepthArgs {
    /// Maximum entry tree nesting depth.
    #[arg(
        long = "max-depth",
        default_value_t = DEFAULT_MAX_DEPTH,
        conflicts_with = "no_depth_limit"
    )]
    max_depth: usize,

    /// Disable the nesting depth limit (trusted input only).
    #[arg(long = "no-depth-limit")]
    no_depth_limit: bool,
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Input appinfo.vdf (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Only include these app ids (repeatable).
    #[arg(long = "app", value_name = "APPID", action = ArgAction::Append)]
    apps: Vec<u32>,

    /// Emit only each record's entry tree.
    #[arg(long = "entries-only")]
    entries_only: bool,

    /// Single-line JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    #[command(flatten)]
    depth: DepthArgs,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Input appinfo.vdf (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    #[command(flatten)]
    depth: DepthArgs,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Dump,
    Header,
    Apps,
}

struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    app_filter: Vec<u32>,
    entries_only: bool,
    compact: bool,
    max_depth: Option<usize>,
}

fn max_depth(depth: &DepthArgs) -> Option<usize> {
    (!depth.no_depth_limit).then_some(depth.max_depth)
}

fn resolve_options(cli: Cli) -> Options {
    let base = |command, input_file, depth: &DepthArgs| Options {
        command,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        input_file,
        output_file: None,
        app_filter: Vec::new(),
        entries_only: false,
        compact: false,
        max_depth: max_depth(depth),
    };

    match cli.command {
        Cmd::Dump(ref args) => Options {
            output_file: args.output.clone(),
            app_filter: args.apps.clone(),
            entries_only: args.entries_only,
            compact: args.compact,
            ..base(Command::Dump, args.input.clone(), &args.depth)
        },
        Cmd::Header(ref args) => base(Command::Header, args.input.clone(), &args.depth),
        Cmd::Apps(ref args) => base(Command::Apps, args.input.clone(), &args.depth),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("bvdf".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared input handling
// ---------------------------------------------------------------------------

fn decode_options(opts: &Options) -> DecodeOptions {
    DecodeOptions {
        max_depth: opts.max_depth,
    }
}

fn input_label(path: Option<&Path>) -> String {
    path.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
}

/// Materialize and decode the input. Errors are printed; `None` means exit 1.
fn load(opts: &Options) -> Option<(Document, DecodeStats)> {
    let decode_opts = decode_options(opts);
    let result = match &opts.input_file {
        Some(path) => bvdf_io::decode_file(path, &decode_opts),
        None => bvdf_io::decode_reader(io::stdin().lock(), &decode_opts),
    };

    match result {
        Ok(loaded) => Some(loaded),
        Err(IoError::Io(e)) => {
            eprintln!("bvdf: input file: {}: {e}", input_label(opts.input_file.as_deref()));
            None
        }
        Err(IoError::Decode(e)) => {
            eprintln!("bvdf: {}: decode error: {e}", input_label(opts.input_file.as_deref()));
            None
        }
    }
}

fn print_stats(opts: &Options, command: &str, stats: &DecodeStats) {
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "bvdf: {command}: input size: {}, version: {}, apps: {}",
            stats.input_size, stats.version, stats.apps
        );
    }

    if opts.json_output {
        let json = serde_json::json!({
            "command": command,
            "input_size": stats.input_size,
            "version": stats.version.number(),
            "apps": stats.apps,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(text) => eprintln!("{text}"),
            Err(e) => eprintln!("bvdf: stats: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dump command
// ---------------------------------------------------------------------------

fn select<'d>(doc: &'d Document, filter: &[u32]) -> Vec<&'d AppInfoRecord> {
    doc.iter()
        .filter(|app| filter.is_empty() || filter.contains(&app.appid))
        .collect()
}

fn write_json<T: serde::Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
    compact: bool,
) -> serde_json::Result<()> {
    if compact {
        serde_json::to_writer(&mut *writer, value)
    } else {
        serde_json::to_writer_pretty(&mut *writer, value)
    }
}

fn cmd_dump(opts: &Options) -> i32 {
    let Some((doc, stats)) = load(opts) else {
        return 1;
    };

    let mut output_writer: Box<dyn Write> = match &opts.output_file {
        None => Box::new(BufWriter::with_capacity(BUF_SIZE, io::stdout().lock())),
        Some(path) => {
            if path.exists() && !opts.force {
                eprintln!(
                    "bvdf: output file exists, use -f to overwrite: {}",
                    path.display()
                );
                return 1;
            }
            match File::create(path) {
                Ok(f) => Box::new(BufWriter::with_capacity(BUF_SIZE, f)),
                Err(e) => {
                    eprintln!("bvdf: output file: {}: {e}", path.display());
                    return 1;
                }
            }
        }
    };

    let apps = select(&doc, &opts.app_filter);
    debug!("dump: {} of {} apps selected", apps.len(), doc.len());

    let written = if opts.entries_only {
        let trees: Vec<&EntryTree> = apps.iter().map(|app| &app.entries).collect();
        write_json(&mut output_writer, &trees, opts.compact)
    } else {
        write_json(&mut output_writer, &apps, opts.compact)
    };
    if let Err(e) = written {
        eprintln!("bvdf: write error: {e}");
        return 1;
    }

    if let Err(e) = writeln!(output_writer).and_then(|()| output_writer.flush()) {
        eprintln!("bvdf: write flush error: {e}");
        return 1;
    }

    print_stats(opts, "dump", &stats);
    0
}

// ---------------------------------------------------------------------------
// Header command
// ---------------------------------------------------------------------------

fn cmd_header(opts: &Options) -> i32 {
    let Some((doc, stats)) = load(opts) else {
        return 1;
    };

    if !opts.quiet {
        let header = &doc.header;
        println!("VDF version:          {}", header.version);
        println!("VDF magic:            {:#010X}", header.version.magic());
        println!("VDF universe:         {}", header.universe);
        match header.string_table_offset {
            Some(offset) => {
                println!("VDF string table:     {offset:#010X}");
                println!("VDF string pool size: {}", doc.string_pool_len);
            }
            None => println!("VDF string table:     none (inline keys)"),
        }
        println!("VDF apps:             {}", doc.len());
    }

    print_stats(opts, "header", &stats);
    0
}

// ---------------------------------------------------------------------------
// Apps command
// ---------------------------------------------------------------------------

fn format_app_line(app: &AppInfoRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        app.appid,
        app.change_number,
        app.last_updated,
        app.name().unwrap_or("-")
    )
}

fn cmd_apps(opts: &Options) -> i32 {
    let Some((doc, stats)) = load(opts) else {
        return 1;
    };

    if !opts.quiet {
        let mut out = BufWriter::with_capacity(BUF_SIZE, io::stdout().lock());
        for app in &doc {
            if let Err(e) = writeln!(out, "{}", format_app_line(app)) {
                eprintln!("bvdf: write error: {e}");
                return 1;
            }
        }
        if let Err(e) = out.flush() {
            eprintln!("bvdf: write flush error: {e}");
            return 1;
        }
    }

    print_stats(opts, "apps", &stats);
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    let default_filter = match opts.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Dump => cmd_dump(&opts),
        Command::Header => cmd_header(&opts),
        Command::Apps => cmd_apps(&opts),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
