use config::Config;
use cpu::{Cpu, ExecResult};
use error::SimResult;
use program::Program;

pub mod config;
pub mod cpu;
pub mod error;
pub mod execution_unit;
pub mod inst;
pub mod issue;
pub mod out_of_order;
pub mod program;
pub mod queue;
pub mod rat;
pub mod regs;
pub mod report;
pub mod reservation_station;
pub mod rob;

pub fn parse_and_exec<C: Cpu>(source: &str, config: &Config) -> SimResult<ExecResult> {
    let prog = source.parse::<Program>()?;
    C::new(prog, config)?.exec_all()
}
