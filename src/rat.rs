use crate::inst::{ArchReg, PhysReg};
use std::fmt;

/// Total mapping from architectural to physical registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAliasTable {
    name: &'static str,
    map: Vec<PhysReg>,
}

impl RegisterAliasTable {
    /// Starts with architectural register `i` mapped to physical register `i`.
    pub fn new(name: &'static str, arch_regs: usize) -> Self {
        Self {
            name,
            map: (0..arch_regs).map(PhysReg).collect(),
        }
    }

    pub fn get(&self, reg: ArchReg) -> PhysReg {
        self.map[reg.0]
    }

    /// Installs a new mapping and returns the one it replaced.
    pub fn rename(&mut self, reg: ArchReg, phys: PhysReg) -> PhysReg {
        std::mem::replace(&mut self.map[reg.0], phys)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArchReg, PhysReg)> + '_ {
        self.map.iter().enumerate().map(|(i, &p)| (ArchReg(i), p))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

impl fmt::Display for RegisterAliasTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [", self.name)?;
        for (i, (arch, phys)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arch}->{phys}")?;
        }
        f.write_str("]")
    }
}
