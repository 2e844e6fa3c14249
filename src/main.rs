use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use tacc::regalloc::MIN_REGISTERS;
use tacc::{codegen, ir, lexer, parser, regalloc, sema};

/// Compile a source file through lexing, parsing, semantic analysis, code
/// generation, and register allocation, printing the final IR on success.
#[derive(Debug, ClapParser)]
#[command(name = "tacc", version, about)]
struct Args {
    /// Source file to compile.
    input: PathBuf,

    /// Physical register budget for allocation (must be at least 3).
    #[arg(short = 'O', long = "registers", default_value_t = 8)]
    registers: u32,

    /// Enable debug logging of each phase's progress.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if args.registers < MIN_REGISTERS {
        eprintln!(
            "error: --registers must be at least {MIN_REGISTERS}, got {}",
            args.registers
        );
        return ExitCode::FAILURE;
    }

    let source = match std::fs::read_to_string(&args.input) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error: failed to read {}: {err}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let tokens = match lexer::lex(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let program = match parser::parse(&tokens) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let diagnostics = sema::analyze(&program);
    if !diagnostics.is_empty() {
        for diagnostic in &diagnostics {
            eprintln!("{diagnostic}");
        }
        return ExitCode::from(diagnostics.len().min(255) as u8);
    }

    let generated = codegen::generate(&program);
    let allocated = regalloc::allocate(&generated, args.registers);
    println!("{}", ir::render(&allocated));

    ExitCode::SUCCESS
}
