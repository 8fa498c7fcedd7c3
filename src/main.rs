use std::{path::PathBuf, process::ExitCode, time::Instant};

use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use tomasulo::{
    config::Config,
    cpu::{Cpu, ExecResult},
    error::SimResult,
    issue::{OldestFirst, ScanOrder},
    out_of_order::OutOfOrder,
    program::Program,
    report,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Fixed reservation-station scan order.
    Scan,
    /// Oldest ready instruction first.
    Oldest,
}

/// Cycle-accurate Tomasulo out-of-order pipeline simulator.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Instruction trace, one `<class> <src1> <src2> <dst>` per line.
    trace: PathBuf,

    /// Where to write the per-instruction stage cycles.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON machine description; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    rob: Option<usize>,

    #[arg(long)]
    arch_regs: Option<usize>,

    #[arg(long)]
    phys_regs: Option<usize>,

    #[arg(long)]
    lsq: Option<usize>,

    #[arg(long, value_enum, default_value_t = Policy::Scan)]
    policy: Policy,

    /// -v for stage transitions, -vv for a per-cycle dump of every structure.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> SimResult<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.width = self.width.unwrap_or(config.width);
        config.rob_entries = self.rob.unwrap_or(config.rob_entries);
        config.arch_regs = self.arch_regs.unwrap_or(config.arch_regs);
        config.phys_regs = self.phys_regs.unwrap_or(config.phys_regs);
        config.lsq_entries = self.lsq.unwrap_or(config.lsq_entries);

        Ok(config)
    }
}

fn run(args: &Args) -> SimResult<ExecResult> {
    let config = args.config()?;
    let prog = Program::from_file(&args.trace)?;

    let res = match args.policy {
        Policy::Scan => OutOfOrder::<ScanOrder>::new(prog, &config)?.exec_all()?,
        Policy::Oldest => OutOfOrder::<OldestFirst>::new(prog, &config)?.exec_all()?,
    };

    if let Some(path) = &args.output {
        report::write_timelines_to_file(&res, path)?;
    }

    Ok(res)
}

fn main() -> ExitCode {
    let start = Instant::now();
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let res = match run(&args) {
        Ok(res) => res,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    println!("    EXECUTION COMPLETED");
    println!("    =====================");
    println!("    Instructions retired: {}", res.insts_retired);
    println!("            Cycles taken: {}", res.cycles_taken);
    println!("  Instructions per clock: {:.2}", res.ipc());
    println!(
        "  Simulator time elapsed: {:.2}s",
        start.elapsed().as_secs_f32()
    );

    ExitCode::SUCCESS
}
