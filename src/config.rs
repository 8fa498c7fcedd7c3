use hashbrown::HashMap;
use serde::Deserialize;
use std::path::Path;
use strum::IntoEnumIterator;

use crate::{
    error::{ConfigError, SimError, SimResult},
    inst::{Cycle, FuType},
    program::Program,
    reservation_station::ReservationStation,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub struct FuConfig {
    pub count: usize,
    pub latency: Cycle,
}

/// Machine description used to build a simulator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub arch_regs: usize,
    pub phys_regs: usize,
    pub rob_entries: usize,
    pub width: usize,
    /// Accepted for compatibility; memory ordering is not modelled.
    pub lsq_entries: usize,
    pub func_units: HashMap<FuType, FuConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arch_regs: 32,
            phys_regs: 64,
            rob_entries: 16,
            width: 4,
            lsq_entries: 8,
            func_units: [
                (FuType::Alu, FuConfig { count: 2, latency: 1 }),
                (FuType::Load, FuConfig { count: 1, latency: 2 }),
                (FuType::Store, FuConfig { count: 1, latency: 2 }),
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| SimError::Read(path.to_owned(), e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phys_regs <= self.arch_regs {
            return Err(ConfigError::TooFewPhysRegs {
                arch: self.arch_regs,
                phys: self.phys_regs,
            });
        }
        if self.arch_regs == 0 {
            return Err(ConfigError::Zero("architectural register count"));
        }
        if self.width == 0 {
            return Err(ConfigError::Zero("pipeline width"));
        }
        if self.rob_entries == 0 {
            return Err(ConfigError::Zero("ROB capacity"));
        }

        for fu in FuType::iter() {
            if let Some(cfg) = self.func_units.get(&fu) {
                if cfg.count == 0 || cfg.latency == 0 {
                    return Err(ConfigError::BadFunctionalUnit(fu));
                }
            }
        }

        Ok(())
    }

    /// Checks that the program can run on this machine at all.
    pub fn validate_program(&self, prog: &Program) -> Result<(), ConfigError> {
        for (i, inst) in prog.insts.iter().enumerate() {
            if !self.func_units.contains_key(&inst.fu) {
                return Err(ConfigError::NoReservationStation { inst: i, fu: inst.fu });
            }

            if let Some(reg) = inst.arch_regs().find(|r| r.0 >= self.arch_regs) {
                return Err(ConfigError::RegisterOutOfRange {
                    inst: i,
                    reg,
                    arch_regs: self.arch_regs,
                });
            }
        }

        Ok(())
    }

    /// Reservation stations grouped by unit type, in a fixed order.
    pub fn reservation_stations(&self) -> Vec<ReservationStation> {
        FuType::iter()
            .filter_map(|fu| self.func_units.get(&fu).map(|cfg| (fu, cfg)))
            .flat_map(|(fu, cfg)| (0..cfg.count).map(move |_| ReservationStation::new(fu, cfg.latency)))
            .collect()
    }
}
