use serde::Deserialize;
use std::{fmt, str::FromStr};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};

pub type Cycle = u64;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchReg(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysReg(pub usize);

/// Index of an instruction in program order; also its slot in the arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstId(pub usize);

/// Index of a reservation station in the bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RsId(pub usize);

/// Functional-unit class an instruction needs.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum FuType {
    #[strum(to_string = "ALU", serialize = "A")]
    Alu,
    #[strum(to_string = "LOAD", serialize = "L")]
    Load,
    #[strum(to_string = "STORE", serialize = "S")]
    Store,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Display, EnumIter, EnumCount)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Fetch,
    Decode,
    Dispatch,
    Issue,
    Execute,
    Complete,
    Retire,
}

/// Cycle at which an instruction passed each stage. Every stamp is written once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stamps([Option<Cycle>; Stage::COUNT]);

impl Stamps {
    pub fn get(&self, stage: Stage) -> Option<Cycle> {
        self.0[stage as usize]
    }

    pub fn set(&mut self, stage: Stage, cycle: Cycle) {
        debug_assert!(
            self.0[stage as usize].is_none(),
            "{stage} stamped twice (was {:?}, now {cycle})",
            self.0[stage as usize]
        );
        self.0[stage as usize] = Some(cycle);
    }

    /// All seven stamps, or `None` if the instruction has not retired yet.
    pub fn timeline(&self) -> Option<[Cycle; Stage::COUNT]> {
        let mut out = [0; Stage::COUNT];
        for stage in Stage::iter() {
            out[stage as usize] = self.get(stage)?;
        }
        Some(out)
    }
}

/// An instruction as loaded from the program, before renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inst {
    pub fu: FuType,
    pub src: [Option<ArchReg>; 2],
    pub dst: Option<ArchReg>,
}

/// An instruction's life in the pipeline.
#[derive(Debug, Clone)]
pub struct InFlightInst {
    pub id: InstId,
    pub inst: Inst,
    pub src_phys: [Option<PhysReg>; 2],
    pub dst_phys: Option<PhysReg>,
    pub old_phys: Option<PhysReg>,
    pub stamps: Stamps,
    pub latency: Option<Cycle>,
    pub completed: bool,
    pub rs: Option<RsId>,
}

impl Inst {
    pub fn new(fu: FuType, src1: Option<ArchReg>, src2: Option<ArchReg>, dst: Option<ArchReg>) -> Self {
        Self {
            fu,
            src: [src1, src2],
            dst,
        }
    }

    pub fn arch_regs(&self) -> impl Iterator<Item = ArchReg> + '_ {
        self.src.iter().chain(std::iter::once(&self.dst)).flatten().copied()
    }
}

impl InFlightInst {
    pub fn new(id: InstId, inst: Inst) -> Self {
        Self {
            id,
            inst,
            src_phys: [None; 2],
            dst_phys: None,
            old_phys: None,
            stamps: Stamps::default(),
            latency: None,
            completed: false,
            rs: None,
        }
    }

    pub fn has_issued(&self) -> bool {
        self.stamps.get(Stage::Issue).is_some()
    }
}

impl fmt::Display for ArchReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl fmt::Display for PhysReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I#{}", self.0)
    }
}

struct Opt<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Opt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("-"),
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {}, {}",
            self.fu,
            Opt(self.dst),
            Opt(self.src[0]),
            Opt(self.src[1])
        )
    }
}

impl fmt::Display for InFlightInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.inst)?;
        if self.dst_phys.is_some() || self.src_phys.iter().any(Option::is_some) {
            write!(
                f,
                " -> {}, {}, {} (old {})",
                Opt(self.dst_phys),
                Opt(self.src_phys[0]),
                Opt(self.src_phys[1]),
                Opt(self.old_phys)
            )?;
        }
        Ok(())
    }
}

impl FromStr for ArchReg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix(&['r', 'R'][..]).unwrap_or(s);
        digits
            .parse::<usize>()
            .map(ArchReg)
            .map_err(|_| format!("invalid register: '{s}'"))
    }
}

/// Parses a register operand, where `-` and `-1` mean "no register".
pub fn parse_operand(s: &str) -> Result<Option<ArchReg>, String> {
    match s {
        "-" | "-1" => Ok(None),
        _ => ArchReg::from_str(s).map(Some),
    }
}

impl FromStr for Inst {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split_whitespace().collect::<Vec<_>>();
        let [fu, src1, src2, dst] = fields[..] else {
            return Err(format!(
                "expected '<class> <src1> <src2> <dst>', got {} fields",
                fields.len()
            ));
        };

        let fu = FuType::from_str(fu).map_err(|_| format!("unknown instruction class: '{fu}'"))?;

        Ok(Inst::new(
            fu,
            parse_operand(src1)?,
            parse_operand(src2)?,
            parse_operand(dst)?,
        ))
    }
}
