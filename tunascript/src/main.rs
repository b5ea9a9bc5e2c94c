//! Command-line tooling for `TunaScript` sources and templates.
//!
//! ```text
//! tunascript eval script.tuna --flags start.toml
//! tunascript expand - < room.txt
//! tunascript check room.txt --template --tree
//! tunascript translate script.tuna
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::info;

use tunascript::flagfile::{flags_path_from_env, load_flag_file, render_flag_toml};
use tunascript::{Interpreter, MemoryWorld, Value, expansion, translate_operators};

#[derive(Parser)]
#[command(author, version, about = "Run, expand and check TunaScript sources.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script and print its result.
    Eval(RunArgs),
    /// Expand a template and print the text.
    Expand(RunArgs),
    /// Parse a script or template and report any errors.
    Check(CheckArgs),
    /// Print a script with every operator rewritten as a built-in call.
    Translate(SourceArg),
}

#[derive(Args)]
struct SourceArg {
    /// Source file, or `-` for standard input.
    #[arg(value_name = "FILE")]
    source: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    input: SourceArg,
    /// TOML file with the initial `[flags]` table. Defaults to `$TUNASCRIPT_FLAGS`.
    #[arg(long, value_name = "FILE")]
    flags: Option<PathBuf>,
    /// Set a flag before running, e.g. `--set COINS=5`. May be repeated.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,
    /// Print every flag as TOML after running.
    #[arg(long)]
    dump_flags: bool,
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    input: SourceArg,
    /// Treat the source as an expansion template.
    #[arg(long)]
    template: bool,
    /// Print the parse tree.
    #[arg(long)]
    tree: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {e:#}", "error:".red().bold());
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Eval(args) => run_eval(&args),
        Commands::Expand(args) => run_expand(&args),
        Commands::Check(args) => run_check(&args),
        Commands::Translate(args) => {
            let (_, source) = read_source(&args.source)?;
            println!("{}", translate_operators(&source)?);
            Ok(())
        },
    }
}

/// Read a file, or standard input for `-`, returning a display name too.
fn read_source(path: &Path) -> Result<(String, String)> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).context("reading standard input")?;
        return Ok(("<stdin>".to_string(), text));
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))?;
    Ok((path.display().to_string(), text))
}

fn interpreter(args: &RunArgs, name: String) -> Result<Interpreter<MemoryWorld>> {
    let path = args.flags.clone().or_else(flags_path_from_env);
    let snapshot = match path {
        Some(path) => load_flag_file(&path)?,
        None => HashMap::new(),
    };
    let mut interp = Interpreter::with_flags(MemoryWorld::new(), snapshot);
    for pair in &args.set {
        let (label, value) = pair
            .split_once('=')
            .with_context(|| format!("--set expects NAME=VALUE, got '{pair}'"))?;
        interp.add_flag(label.trim(), value.trim())?;
    }
    interp.set_file(Some(name));
    Ok(interp)
}

fn run_eval(args: &RunArgs) -> Result<()> {
    let (name, source) = read_source(&args.input.source)?;
    let mut interp = interpreter(args, name)?;
    let result = interp.eval(&source)?;
    info!("{} ran to {result:?}", interp.file().unwrap_or_default());

    for line in interp.world_mut().take_output() {
        println!("{line}");
    }
    println!("{} {}", "=>".dimmed(), describe(&result).bold());
    if args.dump_flags {
        print!("{}", render_flag_toml(interp.flags())?);
    }
    Ok(())
}

fn run_expand(args: &RunArgs) -> Result<()> {
    let (name, source) = read_source(&args.input.source)?;
    let mut interp = interpreter(args, name)?;
    let text = interp.expand(&source)?;
    println!("{text}");
    if args.dump_flags {
        print!("{}", render_flag_toml(interp.flags())?);
    }
    Ok(())
}

fn run_check(args: &CheckArgs) -> Result<()> {
    let (name, source) = read_source(&args.input.source)?;
    let tree = if args.template {
        expansion::parse_template(&source)
            .with_context(|| format!("checking template '{name}'"))?
            .to_string()
    } else {
        tunascript::parse(&source)
            .with_context(|| format!("checking script '{name}'"))?
            .to_string()
    };
    if args.tree {
        println!("{tree}");
    }
    println!("{} {name}", "ok".green().bold());
    Ok(())
}

/// A result with its type, e.g. `3.5 (float)` or `@hi@ (text)`.
fn describe(value: &Value) -> String {
    match value {
        Value::Int(_) => format!("{value} (int)"),
        Value::Float(_) => format!("{value} (float)"),
        Value::Text(_) => format!("{} (text)", value.quoted()),
        Value::Bool(_) => format!("{value} (bool)"),
    }
}
