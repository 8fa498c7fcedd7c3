use crate::{
    error::{SimError, SimResult},
    inst::Inst,
};
use std::{path::Path, str::FromStr};

/// A fixed, non-branching instruction stream in program order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub insts: Vec<Inst>,
}

impl FromStr for Program {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut insts = Vec::default();

        for (i, line) in s.lines().enumerate() {
            // Strip comments and empty lines
            let line = &line[..line.find(&[';', '#'][..]).unwrap_or(line.len())];
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // Line numbers start at 1
            let i = i + 1;

            match Inst::from_str(line) {
                Ok(inst) => insts.push(inst),
                Err(e) => {
                    return Err(SimError::Parse {
                        line: i,
                        reason: format!("'{line}': {e}"),
                    })
                }
            }
        }

        Ok(Program { insts })
    }
}

impl From<Vec<Inst>> for Program {
    fn from(insts: Vec<Inst>) -> Self {
        Self { insts }
    }
}

impl Program {
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        std::fs::read_to_string(path)
            .map_err(|e| SimError::Read(path.to_owned(), e))?
            .parse()
    }
}
