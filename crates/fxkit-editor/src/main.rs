//! fxkit - command line entry point
//!
//! ```text
//! fxkit check <file> [--config <json>]
//! fxkit format <file> [--compact] [--version <v>] [--update-imports] [--config <json>]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use fxkit_editor::{init_logging, Editor, EditorConfig};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const USAGE: &str = "usage: fxkit check <file> | fxkit format <file> [--compact] [--version <v>] [--update-imports]";

enum Command {
    Check,
    Format,
}

struct Args {
    command: Command,
    file: PathBuf,
    config: EditorConfig,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let command = match args.next().as_deref() {
        Some("check") => Command::Check,
        Some("format") => Command::Format,
        Some(other) => bail!("unknown command '{other}'\n{USAGE}"),
        None => bail!(USAGE),
    };

    let mut file = None;
    let mut config_path = None;
    let mut compact = false;
    let mut update_imports = false;
    let mut version = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--compact" => compact = true,
            "--update-imports" => update_imports = true,
            "--version" => version = Some(args.next().context("--version needs a value")?),
            "--config" => config_path = Some(args.next().context("--config needs a value")?),
            flag if flag.starts_with("--") => bail!("unknown option '{flag}'\n{USAGE}"),
            _ if file.is_none() => file = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument '{arg}'\n{USAGE}"),
        }
    }

    let mut config = match config_path {
        Some(path) => EditorConfig::load(&path).with_context(|| format!("reading {path}"))?,
        None => EditorConfig::default(),
    };
    config.compact |= compact;
    config.update_imports |= update_imports;
    if let Some(version) = version {
        config.target_version = version;
    }

    Ok(Args {
        command,
        file: file.context(USAGE)?,
        config,
    })
}

fn run(args: Args) -> Result<ExitCode> {
    let editor = Editor::new(args.config)?;
    let mut document = editor
        .open(&args.file)
        .with_context(|| format!("cannot open {}", args.file.display()))?;

    match args.command {
        Command::Check => {
            let name = args.file.display().to_string();
            let errors = document.query_errors();
            for entry in errors {
                println!("{name}: {entry}");
            }
            if errors.is_empty() {
                println!("{name}: ok");
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Format => {
            let report = document.save();
            for omission in &report.omissions {
                eprintln!("{}: omitted {omission}", args.file.display());
            }
            print!("{}", report.text);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> Result<ExitCode> {
    init_logging();
    let args = parse_args(std::env::args().skip(1))?;
    run(args)
}
