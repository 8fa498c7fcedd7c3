use crate::{
    config::Config,
    error::SimResult,
    inst::{Cycle, Stage},
    program::Program,
};
use strum::EnumCount;

/// Cycle at which one instruction passed fetch, decode, dispatch, issue,
/// execute, complete and retire.
pub type Timeline = [Cycle; Stage::COUNT];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub cycles_taken: u64,
    pub insts_retired: u64,
    /// One entry per instruction, in program order.
    pub timelines: Vec<Timeline>,
}

impl ExecResult {
    pub fn ipc(&self) -> f64 {
        if self.cycles_taken == 0 {
            0.0
        } else {
            self.insts_retired as f64 / self.cycles_taken as f64
        }
    }
}

pub trait Cpu: Sized {
    fn new(prog: Program, config: &Config) -> SimResult<Self>;

    fn exec_all(self) -> SimResult<ExecResult>;
}
