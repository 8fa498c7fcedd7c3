use crate::inst::{Cycle, FuType, InstId, PhysReg, RsId};
use std::fmt;

/// A source operand as seen by a reservation station.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    /// The instruction has no operand here.
    Absent,
    Waiting(PhysReg),
    Ready(PhysReg),
}

impl Operand {
    pub fn new(phys: Option<PhysReg>, ready: impl Fn(PhysReg) -> bool) -> Self {
        match phys {
            None => Operand::Absent,
            Some(p) if ready(p) => Operand::Ready(p),
            Some(p) => Operand::Waiting(p),
        }
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self, Operand::Waiting(_))
    }
}

/// Marks every operand waiting on `tag` as ready. Operands waiting on other
/// registers are returned unchanged.
pub fn wakeup(operands: [Operand; 2], tag: PhysReg) -> [Operand; 2] {
    operands.map(|op| match op {
        Operand::Waiting(p) if p == tag => Operand::Ready(p),
        op => op,
    })
}

#[derive(Debug, Clone)]
pub struct ReservationStation {
    pub fu_type: FuType,
    pub latency: Cycle,
    inst: Option<InstId>,
    operands: [Operand; 2],
}

impl ReservationStation {
    pub fn new(fu_type: FuType, latency: Cycle) -> Self {
        Self {
            fu_type,
            latency,
            inst: None,
            operands: [Operand::Absent; 2],
        }
    }

    pub fn is_busy(&self) -> bool {
        self.inst.is_some()
    }

    pub fn is_ready_to_execute(&self) -> bool {
        self.is_busy() && self.operands.iter().all(Operand::is_ready)
    }

    pub fn allocate(&mut self, inst: InstId, operands: [Operand; 2]) {
        debug_assert!(!self.is_busy());
        self.inst = Some(inst);
        self.operands = operands;
    }

    pub fn free(&mut self) {
        self.inst = None;
        self.operands = [Operand::Absent; 2];
    }
}

/// Every reservation station in the machine, in fixed scan order.
#[derive(Debug, Clone)]
pub struct ReservationStations {
    stations: Vec<ReservationStation>,
}

impl ReservationStations {
    pub fn new(stations: Vec<ReservationStation>) -> Self {
        Self { stations }
    }

    pub fn find_free(&self, fu_type: FuType) -> Option<RsId> {
        self.stations
            .iter()
            .position(|rs| rs.fu_type == fu_type && !rs.is_busy())
            .map(RsId)
    }

    pub fn get(&self, id: RsId) -> &ReservationStation {
        &self.stations[id.0]
    }

    pub fn get_mut(&mut self, id: RsId) -> &mut ReservationStation {
        &mut self.stations[id.0]
    }

    /// Slots whose instruction has all operands available, in scan order.
    pub fn ready(&self) -> impl Iterator<Item = (RsId, InstId)> + '_ {
        self.iter().filter_map(|(id, rs)| {
            rs.inst
                .filter(|_| rs.is_ready_to_execute())
                .map(|inst| (id, inst))
        })
    }

    /// Wakes up every slot waiting on `tag`.
    pub fn broadcast(&mut self, tag: PhysReg) {
        for rs in &mut self.stations {
            rs.operands = wakeup(rs.operands, tag);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RsId, &ReservationStation)> + '_ {
        self.stations.iter().enumerate().map(|(i, rs)| (RsId(i), rs))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Absent => f.write_str("-"),
            Operand::Waiting(p) => write!(f, "{p}"),
            Operand::Ready(p) => write!(f, "{p}+"),
        }
    }
}

impl fmt::Display for ReservationStations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reservation Stations: [")?;
        for (id, rs) in self.iter() {
            match rs.inst {
                Some(inst) => writeln!(
                    f,
                    "\t#{} {} busy {} {} {}",
                    id.0, rs.fu_type, inst, rs.operands[0], rs.operands[1]
                )?,
                None => writeln!(f, "\t#{} {} free", id.0, rs.fu_type)?,
            }
        }
        f.write_str("]")
    }
}
