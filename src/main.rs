use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use brewin::console::Console;
use brewin::error::BrewinError;
use brewin::interpreter::Interpreter;
use brewin::parser::parse_program;
use brewin::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Brewin language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a source file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Parses a source file and prints its AST as JSON
    Parse { filename: Option<PathBuf> },

    /// Runs a source file's main() function
    Run { filename: Option<PathBuf> },
}

/// Source text of a file. Non-empty files are memory-mapped.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the mapping is read-only and dropped before this function returns.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;
    let source = std::str::from_utf8(&map)
        .map_err(BrewinError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("brewin::").unwrap_or(module);
            writeln!(
                buf,
                "{} [{}:{}] {} - {}",
                Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Process exit status for a failed run.
fn exit_code(err: &BrewinError) -> i32 {
    if matches!(err, BrewinError::Lex { .. } | BrewinError::Parse { .. }) {
        65
    } else {
        70
    }
}

fn fail(err: BrewinError) -> ! {
    debug!("Aborting: {}, is_runtime={}", err, err.is_runtime());
    eprintln!("{}", err);
    std::process::exit(exit_code(&err));
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let filename = match &args.commands {
        Commands::Tokenize { filename }
        | Commands::Parse { filename }
        | Commands::Run { filename } => filename.clone(),
    };

    let Some(filename) = filename else {
        info!("No filepath provided");
        println!("No input filepath was provided. Exiting...");
        std::process::exit(0);
    };

    let source = read_file(&filename)?;

    match args.commands {
        Commands::Tokenize { .. } => {
            info!("Running Tokenize subcommand");
            let mut tokenized = true;

            for token in Scanner::new(&source) {
                match token {
                    Ok(token) => {
                        debug!("Scanned token: {}", token);
                        println!("{}", token);
                    }

                    Err(e) => {
                        tokenized = false;
                        debug!("Tokenization debug: {}", e);
                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { .. } => {
            info!("Running Parse subcommand");

            let program = parse_program(&source).unwrap_or_else(|e| fail(e));
            let json = serde_json::to_string_pretty(&program).context("Failed to serialize AST")?;

            println!("{}", json);
            info!("Parse subcommand completed");
        }

        Commands::Run { .. } => {
            info!("Running Run subcommand");
            info!("Provided input:\n {}", source);

            let program = parse_program(&source).unwrap_or_else(|e| fail(e));
            info!("Parsed {} functions", program.functions.len());

            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout().lock();

            let mut interpreter = Interpreter::new(&program, Console::new(&mut input, &mut output));

            if let Err(e) = interpreter.run() {
                fail(e);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
