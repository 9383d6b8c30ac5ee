use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use wisp::Source;

/// A small dynamically-typed scripting language with a bytecode VM and
/// cooperative coroutines.
#[derive(Parser, Debug)]
#[command(name = "wisp", version, about)]
struct Args {
    /// Total heap budget, in megabytes, split across the VM's per-kind arenas.
    #[arg(short = 'm', long = "memory", default_value_t = 8)]
    memory: u64,

    /// Path to the script to run.
    script: PathBuf,
}

pub fn main() -> ExitCode {
    let args = Args::parse();

    let source = match Source::path(&args.script) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: could not read '{}': {}", args.script.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let program = match wisp::compile(source) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match wisp::run(program, args.memory.max(1), &mut handle) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
