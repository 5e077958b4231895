use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use opcode_vm::config::{DEFAULT_AMBIGUITY_THRESHOLD, PROGRAM_REGISTER_COUNT, SAMPLE_REGISTER_COUNT};
use opcode_vm::{
    count_ambiguous_samples, find_halting_values, resolve, ExecutionState, ProgramParser,
    RunConfig, Runner,
};

#[derive(Parser, Debug)]
#[command(name = "opvm", about = "Run, resolve and inspect register-machine programs.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run an `#ip` program and print the final registers.
    Run {
        file: PathBuf,

        /// Initial register value, as INDEX=VALUE (repeatable).
        #[arg(long = "seed", value_name = "INDEX=VALUE", value_parser = parse_seed)]
        seeds: Vec<(usize, i64)>,

        #[arg(long, default_value_t = PROGRAM_REGISTER_COUNT)]
        registers: usize,

        /// Replace recognized loop idioms with closed-form updates.
        #[arg(long, default_value_t = false)]
        optimize: bool,

        /// Replay each shortcut without it and fail on mismatch (implies --optimize).
        #[arg(long, default_value_t = false)]
        verify: bool,

        #[arg(long, value_name = "N")]
        step_limit: Option<u64>,
    },
    /// Count ambiguous samples, resolve opcodes and run the trailing program.
    Samples {
        file: PathBuf,

        #[arg(long, default_value_t = DEFAULT_AMBIGUITY_THRESHOLD)]
        threshold: usize,
    },
    /// Report the watched-register values that halt the program first and last.
    Halting {
        file: PathBuf,

        #[arg(long)]
        address: usize,

        #[arg(long)]
        register: usize,

        #[arg(long, default_value_t = false)]
        optimize: bool,
    },
}

fn parse_seed(text: &str) -> Result<(usize, i64), String> {
    let (index, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=VALUE, got '{text}'"))?;
    let index = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid register index '{index}'"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid register value '{value}'"))?;
    Ok((index, value))
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let parser = ProgramParser::new();

    match cli.command {
        Command::Run {
            file,
            seeds,
            registers,
            optimize,
            verify,
            step_limit,
        } => {
            let program = parser
                .parse_program(&read_source(&file)?)
                .with_context(|| format!("parsing {}", file.display()))?;
            let mut config = RunConfig::new().with_verification(verify);
            if let Some(limit) = step_limit {
                config = config.with_step_limit(limit);
            }
            let mut runner = Runner::new(&program).with_config(config);
            if optimize || verify {
                runner = runner.with_detected_optimizers();
            }
            let initial = ExecutionState::seeded(registers, &seeds)?;
            let report = runner.run(initial)?;
            println!("registers: {:?}", report.state.registers);
            println!("ip: {}", report.state.ip);
            println!("steps: {} (shortcuts: {})", report.steps, report.shortcuts);
        }
        Command::Samples { file, threshold } => {
            let document = parser
                .parse_sample_document(&read_source(&file)?)
                .with_context(|| format!("parsing {}", file.display()))?;
            println!(
                "samples with >= {threshold} candidates: {}",
                count_ambiguous_samples(&document.samples, threshold)
            );
            let mapping = resolve(&document.samples)?;
            for (opcode, operation) in mapping.iter() {
                println!("{opcode:>2} => {operation}");
            }
            let program = mapping.translate(&document.program)?;
            let report = Runner::new(&program).run(ExecutionState::zeroed(SAMPLE_REGISTER_COUNT))?;
            println!("registers: {:?}", report.state.registers);
        }
        Command::Halting {
            file,
            address,
            register,
            optimize,
        } => {
            let program = parser
                .parse_program(&read_source(&file)?)
                .with_context(|| format!("parsing {}", file.display()))?;
            let mut runner = Runner::new(&program);
            if optimize {
                runner = runner.with_detected_optimizers();
            }
            let values = find_halting_values(
                &runner,
                ExecutionState::zeroed(PROGRAM_REGISTER_COUNT),
                address,
                register,
            )?;
            println!("fewest steps: {}", values.first);
            println!("most steps: {}", values.last);
            println!("distinct values: {}", values.distinct);
        }
    }
    Ok(())
}
