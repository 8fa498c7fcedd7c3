use std::path::PathBuf;

use thiserror::Error;

use crate::inst::{ArchReg, Cycle, FuType};

/// Everything that can end a simulation run early.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(
        "Deadlock at cycle {cycle}: no stage made progress with {retired}/{total} instructions retired"
    )]
    Deadlock {
        cycle: Cycle,
        retired: usize,
        total: usize,
    },

    #[error("Failed to read '{0}': {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write '{0}': {1}")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to write results: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Problems with the machine description or the program it is asked to run.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("physical register count ({phys}) must exceed architectural register count ({arch})")]
    TooFewPhysRegs { arch: usize, phys: usize },

    #[error("{0} must be at least 1")]
    Zero(&'static str),

    #[error("functional unit {0} needs at least one instance and a latency of at least one cycle")]
    BadFunctionalUnit(FuType),

    #[error("instruction {inst} needs a {fu} reservation station but none is configured")]
    NoReservationStation { inst: usize, fu: FuType },

    #[error("instruction {inst} uses {reg} but only {arch_regs} architectural registers exist")]
    RegisterOutOfRange {
        inst: usize,
        reg: ArchReg,
        arch_regs: usize,
    },
}

pub type SimResult<T> = Result<T, SimError>;
