//! excelab - Merge, clean and split spreadsheet data

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use encoding_rs::Encoding;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use excelab::config::{EngineConfig, MergeMode, OutputFormat};
use excelab::output::{stdout_stream, zip_buffers, OutputFactory};
use excelab::parser::Upload;
use excelab::{pipeline, CleanOptions, EngineError, ErrorKind};

/// Merge, clean and split spreadsheet data (CSV, Excel)
#[derive(Parser, Debug)]
#[command(name = "excelab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Rows per exported sheet before starting a new one
    #[arg(long, global = true, default_value_t = 1_000_000)]
    max_rows_per_sheet: usize,

    /// Base name of exported sheets
    #[arg(long, global = true, default_value = "Merged_Data")]
    sheet_name: String,

    /// Encoding tried for CSV files that are not valid UTF-8
    #[arg(long, global = true, default_value = "gbk")]
    encoding: String,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge every sheet of every file into one workbook
    Merge {
        /// Input files (.csv, .xlsx, .xls)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Column reconciliation policy: union (outer) or intersection (inner)
        #[arg(short, long, default_value = "union")]
        mode: MergeMode,

        /// Output workbook
        #[arg(short, long, default_value = "merged.xlsx")]
        output: PathBuf,
    },

    /// Show the first rows of a merge without writing it
    Preview {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Column reconciliation policy: union (outer) or intersection (inner)
        #[arg(short, long, default_value = "union")]
        mode: MergeMode,

        /// Rows to show (default 10)
        #[arg(long)]
        rows: Option<usize>,

        /// Output format: terminal or json
        #[arg(short, long, default_value = "terminal")]
        format: OutputFormat,
    },

    /// List the column names of a file's first sheet
    Columns {
        file: PathBuf,

        /// Output format: terminal or json
        #[arg(short, long, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Split a file's first sheet into one workbook per value of a column
    Split {
        file: PathBuf,

        /// Column to group by
        #[arg(short, long)]
        column: String,

        /// Output zip archive
        #[arg(short, long, default_value = "split_files.zip")]
        output: PathBuf,
    },

    /// Remove empty rows/columns and trim whitespace
    Clean {
        file: PathBuf,

        #[command(flatten)]
        options: CleanArgs,

        /// Report what would change instead of writing a workbook
        #[arg(long)]
        preview: bool,

        /// Rows to show with --preview (default 5)
        #[arg(long)]
        rows: Option<usize>,

        /// Output format: terminal or json
        #[arg(short, long, default_value = "terminal")]
        format: OutputFormat,

        /// Output workbook
        #[arg(short, long, default_value = "cleaned.xlsx")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Keep rows whose cells are all empty
    #[arg(long)]
    keep_empty_rows: bool,

    /// Keep columns whose cells are all empty
    #[arg(long)]
    keep_empty_cols: bool,

    /// Trim leading/trailing whitespace in text columns
    #[arg(long)]
    trim: bool,
}

impl From<&CleanArgs> for CleanOptions {
    fn from(args: &CleanArgs) -> Self {
        CleanOptions {
            remove_empty_rows: !args.keep_empty_rows,
            remove_empty_cols: !args.keep_empty_cols,
            trim_spaces: args.trim,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", error_message(&e));
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _tracing = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .try_init();
}

/// Full context chain, except that internal engine failures show only
/// their generic message
fn error_message(err: &anyhow::Error) -> String {
    let internal = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<EngineError>())
        .any(|engine| engine.kind() == ErrorKind::Internal);
    if !internal {
        return format!("{:#}", err);
    }

    let mut parts = Vec::new();
    for cause in err.chain() {
        if let Some(engine) = cause.downcast_ref::<EngineError>() {
            parts.push(engine.to_string());
            break;
        }
        parts.push(cause.to_string());
    }
    parts.join(": ")
}

/// 1 for bad input, 2 for everything else
fn exit_code(err: &anyhow::Error) -> u8 {
    let invalid_input = err.chain().any(|cause| {
        if let Some(engine) = cause.downcast_ref::<EngineError>() {
            engine.kind() == ErrorKind::InvalidInput
        } else if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            io.kind() == std::io::ErrorKind::NotFound
        } else {
            false
        }
    });
    if invalid_input {
        1
    } else {
        2
    }
}

fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let encoding = Encoding::for_label(cli.encoding.as_bytes())
        .with_context(|| format!("Unknown encoding: {}", cli.encoding))?;
    Ok(EngineConfig::new()
        .with_max_rows_per_sheet(cli.max_rows_per_sheet)
        .with_sheet_name(cli.sheet_name.clone())
        .with_fallback_encoding(encoding))
}

fn read_upload(path: &Path) -> Result<Upload> {
    Upload::from_path(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    paths.iter().map(|p| read_upload(p)).collect()
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    match &cli.command {
        Command::Merge {
            files,
            mode,
            output,
        } => {
            let uploads = read_uploads(files)?;
            let bytes = pipeline::merge_export(&uploads, *mode, &config)?;
            write_output(output, &bytes)?;
            println!("Merged {} file(s) into {}", files.len(), output.display());
        }

        Command::Preview {
            files,
            mode,
            rows,
            format,
        } => {
            let uploads = read_uploads(files)?;
            let preview = pipeline::merge_preview(&uploads, *mode, *rows, &config)?;
            let format = *format;
            let mut stdout = stdout_stream(format);
            OutputFactory::create(format).render_preview(&preview, &mut stdout)?;
        }

        Command::Columns { file, format } => {
            let upload = read_upload(file)?;
            let columns = pipeline::list_columns(&upload, &config)?;
            let mut stdout = std::io::stdout().lock();
            match format {
                OutputFormat::Json => {
                    serde_json::to_writer(&mut stdout, &serde_json::json!({ "columns": columns }))?;
                    writeln!(stdout)?;
                }
                OutputFormat::Terminal => {
                    for column in &columns {
                        writeln!(stdout, "{}", column)?;
                    }
                }
            }
        }

        Command::Split {
            file,
            column,
            output,
        } => {
            let upload = read_upload(file)?;
            let files = pipeline::split(&upload, column, &config)?;
            let archive = zip_buffers(&files)?;
            write_output(output, &archive)?;
            println!("Wrote {} group file(s) to {}", files.len(), output.display());
        }

        Command::Clean {
            file,
            options,
            preview,
            rows,
            format,
            output,
        } => {
            let upload = read_upload(file)?;
            let options = CleanOptions::from(options);
            if *preview {
                let report = pipeline::clean_preview(&upload, options, *rows, &config)?;
                let format = *format;
                let mut stdout = stdout_stream(format);
                OutputFactory::create(format).render_clean_preview(&report, &mut stdout)?;
            } else {
                let bytes = pipeline::clean_export(&upload, options, &config)?;
                write_output(output, &bytes)?;
                println!("Cleaned {} into {}", file.display(), output.display());
            }
        }
    }

    Ok(())
}
