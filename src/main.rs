//! cellgraph - run sheet commands from the command line, a script, or stdin

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use cellgraph::run_script;
use cellgraph_core::create_sheet;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cellgraph", version, about = "Spreadsheet cell engine driver")]
struct Args {
    /// Command script to run (reads stdin when omitted)
    script: Option<PathBuf>,

    /// Run this command instead of a script (can be repeated)
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    /// Log sheet mutations at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Keep running after a command fails
    #[arg(long)]
    keep_going: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_script(args: &Args) -> anyhow::Result<String> {
    if !args.commands.is_empty() {
        return Ok(args.commands.join("\n"));
    }
    match &args.script {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display())),
        None => {
            let mut script = String::new();
            io::stdin()
                .read_to_string(&mut script)
                .context("Failed to read commands from stdin")?;
            Ok(script)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<usize> {
    let script = load_script(args)?;
    let mut sheet = create_sheet();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let failures = run_script(&mut sheet, &script, &mut out, args.keep_going)?;
    out.flush()?;
    Ok(failures)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(0) => {}
        Ok(failures) => {
            log::debug!("{} command(s) failed", failures);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
