use crate::{
    inst::{ArchReg, PhysReg},
    rat::RegisterAliasTable,
};
use std::{collections::VecDeque, fmt};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrfEntry {
    /// Sitting in the free list.
    Free,
    /// Allocated to an in-flight producer that has not completed.
    Pending,
    /// Mapped and readable.
    Ready,
    /// Vacated at retire, back in the free list next cycle.
    Released,
}

/// Register renamer: speculative and committed map tables plus the free list.
#[derive(Debug, Clone)]
pub struct RegFile {
    rat: RegisterAliasTable,
    arch_rat: RegisterAliasTable,
    phys_rf: Vec<PrfEntry>,
    free_list: VecDeque<PhysReg>,
    released: Vec<PhysReg>,
}

impl RegFile {
    pub fn new(arch_regs: usize, phys_regs: usize) -> Self {
        assert!(arch_regs < phys_regs);

        let mut phys_rf = vec![PrfEntry::Free; phys_regs];
        phys_rf[..arch_regs].fill(PrfEntry::Ready);

        Self {
            rat: RegisterAliasTable::new("Mapping Table", arch_regs),
            arch_rat: RegisterAliasTable::new("Arch Mapping Table", arch_regs),
            phys_rf,
            free_list: (arch_regs..phys_regs).map(PhysReg).collect(),
            released: Vec::new(),
        }
    }

    pub fn get_alias(&self, reg: ArchReg) -> PhysReg {
        self.rat.get(reg)
    }

    pub fn get_committed_alias(&self, reg: ArchReg) -> PhysReg {
        self.arch_rat.get(reg)
    }

    /// Points the speculative mapping at `phys`, returning the mapping it replaced.
    pub fn set_alias(&mut self, reg: ArchReg, phys: PhysReg) -> PhysReg {
        self.rat.rename(reg, phys)
    }

    /// Retire only.
    pub fn commit_alias(&mut self, reg: ArchReg, phys: PhysReg) {
        let _ = self.arch_rat.rename(reg, phys);
    }

    pub fn allocate_phys(&mut self) -> Option<PhysReg> {
        let slot = self.free_list.pop_front()?;
        debug_assert_eq!(self.phys_rf[slot.0], PrfEntry::Free);
        self.phys_rf[slot.0] = PrfEntry::Pending;

        Some(slot)
    }

    /// The register only becomes allocatable after the next [`RegFile::reclaim`].
    pub fn release_phys(&mut self, slot: PhysReg) {
        debug_assert!(
            matches!(self.phys_rf[slot.0], PrfEntry::Ready | PrfEntry::Pending),
            "released {slot} while {:?}",
            self.phys_rf[slot.0]
        );
        self.phys_rf[slot.0] = PrfEntry::Released;
        self.released.push(slot);
    }

    /// Merges last cycle's released registers into the free list.
    pub fn reclaim(&mut self) {
        for slot in self.released.drain(..) {
            self.phys_rf[slot.0] = PrfEntry::Free;
            self.free_list.push_back(slot);
        }
    }

    pub fn set_ready(&mut self, slot: PhysReg) {
        self.phys_rf[slot.0] = PrfEntry::Ready;
    }

    pub fn is_ready(&self, slot: PhysReg) -> bool {
        self.phys_rf[slot.0] == PrfEntry::Ready
    }

    pub fn get_phys(&self, slot: PhysReg) -> PrfEntry {
        self.phys_rf[slot.0]
    }

    pub fn num_phys(&self) -> usize {
        self.phys_rf.len()
    }

    pub fn free_list(&self) -> impl Iterator<Item = PhysReg> + '_ {
        self.free_list.iter().copied()
    }

    /// Every register is in exactly one state, and the free list and release
    /// buffer agree with the per-register state.
    pub fn check_invariants(&self) -> Result<(), String> {
        let count = |state| self.phys_rf.iter().filter(|&&e| e == state).count();

        if count(PrfEntry::Free) != self.free_list.len() {
            return Err(format!(
                "{} registers marked free but free list holds {}",
                count(PrfEntry::Free),
                self.free_list.len()
            ));
        }
        if count(PrfEntry::Released) != self.released.len() {
            return Err(format!(
                "{} registers marked released but release buffer holds {}",
                count(PrfEntry::Released),
                self.released.len()
            ));
        }
        if let Some(p) = self.free_list().find(|p| self.phys_rf[p.0] != PrfEntry::Free) {
            return Err(format!("{p} in free list while {:?}", self.phys_rf[p.0]));
        }
        for (arch, phys) in self.rat.iter() {
            if matches!(self.phys_rf[phys.0], PrfEntry::Free | PrfEntry::Released) {
                return Err(format!("{arch} maps to reclaimed register {phys}"));
            }
        }

        Ok(())
    }
}

impl fmt::Display for RegFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.rat)?;
        writeln!(f, "{}", self.arch_rat)?;
        f.write_str("Free List: [")?;
        for (i, p) in self.free_list().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str("]")
    }
}
