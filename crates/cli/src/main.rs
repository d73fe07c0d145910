// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod program;

use anyhow::Result;
use armulet_config::EmulatorConfig;
use armulet_core::context::PC_REG;
use armulet_core::unwind::{analyze_prologue, UnwindOptions, UnwindPlan};
use armulet_core::{
    ArmEmulator, EmulationState, EmulatorOptions, InstructionEmulator, ProcessorMode, Retired,
};
use clap::{Args, Parser, Subcommand};
use program::{assemble, parse_u32_addr, RegAssignment};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

const EXIT_PASS: u8 = 0;
const EXIT_EMULATION_ERROR: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Armulet ARM/Thumb instruction emulator", long_about = None)]
struct Cli {
    /// Enable debug-level logging of decode and condition decisions
    #[arg(short, long, global = true)]
    trace: bool,

    /// Maximum log level (error, warn, info, debug, trace); overrides --trace
    #[arg(long, global = true)]
    log_level: Option<tracing::Level>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate opcodes one by one and print every tagged write.
    Step(StepArgs),

    /// Synthesize an unwind plan from a function prologue.
    Unwind(UnwindArgs),
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Emulator configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Architecture variant, overrides the configuration
    #[arg(long)]
    arch: Option<String>,

    /// Decode the opcodes as Thumb
    #[arg(long)]
    thumb: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct StepArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Address the first opcode is loaded at
    #[arg(long, default_value = "0x8000", value_parser = parse_u32_addr)]
    pc: u32,

    /// Initial CPSR; the T bit follows --thumb
    #[arg(long, default_value = "0", value_parser = parse_u32_addr)]
    cpsr: u32,

    /// Initial register value (repeatable), e.g. r0=0x10 or sp=0x2000
    #[arg(long = "reg")]
    regs: Vec<RegAssignment>,

    /// Maximum number of instructions to evaluate
    #[arg(long, default_value = "1000")]
    max_steps: usize,

    /// Opcodes in hex
    #[arg(required = true)]
    opcodes: Vec<String>,
}

#[derive(Args, Debug)]
struct UnwindArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Function entry address
    #[arg(long, default_value = "0x8000", value_parser = parse_u32_addr)]
    addr: u32,

    /// Opcodes in hex
    #[arg(required = true)]
    opcodes: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // --log-level wins over --trace
    let level = match (cli.log_level, cli.trace) {
        (Some(level), _) => level,
        (None, true) => tracing::Level::DEBUG,
        (None, false) => tracing::Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Step(args) => run_step(args),
        Commands::Unwind(args) => run_unwind(args),
    }
}

fn load_config(session: &SessionArgs) -> Result<EmulatorConfig> {
    let mut config = match &session.config {
        Some(path) => EmulatorConfig::from_file(path)?,
        None => EmulatorConfig::default(),
    };
    if let Some(arch) = &session.arch {
        config.arch = arch.clone();
    }
    config.validate()?;
    Ok(config)
}

fn mode_of(session: &SessionArgs) -> ProcessorMode {
    if session.thumb {
        ProcessorMode::Thumb
    } else {
        ProcessorMode::Arm
    }
}

fn run_step(args: StepArgs) -> ExitCode {
    let config = match load_config(&args.session) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let code = match assemble(&args.opcodes, args.session.thumb) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if args.regs.iter().any(|reg| reg.index == PC_REG) {
        error!("The program counter is set with --pc, not --reg");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let mut state = EmulationState::zero_filled();
    state.load(u64::from(args.pc), &code);
    state.set_sp(config.unwind.initial_sp);
    for reg in &args.regs {
        state.set_core(reg.index, reg.value);
    }
    state.set_pc(args.pc);
    state.set_cpsr(args.cpsr);
    state.set_thumb(args.session.thumb);

    let mut emulator = ArmEmulator::from_config(state, &config);
    // stepping needs the PC to move past every instruction
    emulator.set_options(EmulatorOptions {
        auto_advance_pc: true,
        ..EmulatorOptions::from(&config)
    });

    let end = u64::from(args.pc) + code.len() as u64;
    for _ in 0..args.max_steps {
        let pc = u64::from(emulator.access().pc());
        if pc < u64::from(args.pc) || pc >= end {
            break;
        }
        if let Err(e) = step_once(&mut emulator, args.session.json) {
            error!("{:#}", e);
            return ExitCode::from(EXIT_EMULATION_ERROR);
        }
    }
    ExitCode::from(EXIT_PASS)
}

fn step_once(emulator: &mut ArmEmulator<EmulationState>, json: bool) -> Result<()> {
    let inst = emulator.read_instruction()?;
    let retired = emulator.evaluate_instruction()?;
    let writes = emulator.access_mut().take_writes();

    if json {
        for write in &writes {
            println!("{}", serde_json::to_string(write)?);
        }
    } else {
        let note = match retired {
            Retired::Executed => "",
            Retired::ConditionFailed => " (condition failed)",
        };
        println!("{:#010x}: {:#010x}{}", inst.address, inst.opcode, note);
        for write in &writes {
            println!("    {}", write);
        }
    }
    Ok(())
}

fn run_unwind(args: UnwindArgs) -> ExitCode {
    let config = match load_config(&args.session) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let code = match assemble(&args.opcodes, args.session.thumb) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let options = UnwindOptions::from(&config);
    let plan = match analyze_prologue(&code, args.addr, mode_of(&args.session), &options) {
        Ok(plan) => plan,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_EMULATION_ERROR);
        }
    };

    if let Err(e) = print_plan(&plan, args.session.json) {
        error!("{:#}", e);
        return ExitCode::from(EXIT_EMULATION_ERROR);
    }
    ExitCode::from(EXIT_PASS)
}

fn print_plan(plan: &UnwindPlan, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }
    for row in &plan.rows {
        let mut line = format!("+{:#x}: CFA={}{:+}", row.offset, row.cfa.register, row.cfa.offset);
        for saved in &row.saved {
            line.push_str(&format!(" {}@CFA{:+}", saved.register, saved.offset));
        }
        println!("{}", line);
    }
    Ok(())
}
