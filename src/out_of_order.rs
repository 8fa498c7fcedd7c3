use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::{
    config::Config,
    cpu::{Cpu, ExecResult},
    error::{SimError, SimResult},
    execution_unit::ExecutionUnits,
    inst::{Cycle, InFlightInst, InstId, PhysReg, Stage},
    issue::{IssuePolicy, ScanOrder},
    program::Program,
    queue::Queue,
    regs::{PrfEntry, RegFile},
    reservation_station::{Operand, ReservationStations},
    rob::ReorderBuffer,
};

/// How many instructions each stage moved during one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub retired: usize,
    pub completed: usize,
    pub executed: usize,
    pub issued: usize,
    pub dispatched: usize,
    pub decoded: usize,
    pub fetched: usize,
    /// Still waiting out their latency after this cycle.
    pub executing: usize,
}

impl TickReport {
    pub fn made_progress(&self) -> bool {
        self.retired
            + self.completed
            + self.executed
            + self.issued
            + self.dispatched
            + self.decoded
            + self.fetched
            + self.executing
            > 0
    }
}

#[derive(Debug, Clone)]
pub struct OutOfOrder<P: IssuePolicy = ScanOrder> {
    insts: Vec<InFlightInst>,
    fetch_ptr: usize,
    decode_queue: Queue<InstId>,
    dispatch_queue: Queue<InstId>,
    execute_queue: Queue<InstId>,
    execution_units: ExecutionUnits,
    reservation_stations: ReservationStations,
    rob: ReorderBuffer,
    reg_file: RegFile,
    width: usize,
    cycles: Cycle,
    insts_retired: usize,
    policy: PhantomData<P>,
}

impl<P: IssuePolicy> Cpu for OutOfOrder<P> {
    fn new(prog: Program, config: &Config) -> SimResult<Self> {
        config.validate()?;
        config.validate_program(&prog)?;

        debug!(
            width = config.width,
            rob = config.rob_entries,
            arch_regs = config.arch_regs,
            phys_regs = config.phys_regs,
            policy = P::NAME,
            "building out-of-order core"
        );
        if config.lsq_entries > 0 {
            debug!(
                lsq_entries = config.lsq_entries,
                "load/store queue size accepted but memory ordering is not modelled"
            );
        }

        Ok(Self {
            insts: prog
                .insts
                .into_iter()
                .enumerate()
                .map(|(i, inst)| InFlightInst::new(InstId(i), inst))
                .collect(),
            fetch_ptr: 0,
            decode_queue: Queue::new(config.width),
            dispatch_queue: Queue::new(config.width),
            execute_queue: Queue::new(config.width),
            execution_units: ExecutionUnits::new(),
            reservation_stations: ReservationStations::new(config.reservation_stations()),
            rob: ReorderBuffer::new(config.rob_entries),
            reg_file: RegFile::new(config.arch_regs, config.phys_regs),
            width: config.width,
            cycles: 0,
            insts_retired: 0,
            policy: PhantomData,
        })
    }

    fn exec_all(mut self) -> SimResult<ExecResult> {
        while !self.is_finished() {
            let cycle = self.cycles;

            if !self.tick().made_progress() {
                return Err(SimError::Deadlock {
                    cycle,
                    retired: self.insts_retired,
                    total: self.insts.len(),
                });
            }
        }

        Ok(ExecResult {
            cycles_taken: self.cycles,
            insts_retired: self.insts_retired as u64,
            timelines: self
                .insts
                .iter()
                .filter_map(|inst| inst.stamps.timeline())
                .collect(),
        })
    }
}

impl<P: IssuePolicy> OutOfOrder<P> {
    /// Simulates one cycle. Stages run back to front so that anything freed
    /// downstream can be claimed upstream in the same cycle.
    pub fn tick(&mut self) -> TickReport {
        self.reg_file.reclaim();

        let retired = self.stage_retire();
        let completed = self.stage_complete();
        let executed = self.stage_execute();
        let issued = self.stage_issue();
        let dispatched = self.stage_dispatch();
        let decoded = self.stage_decode();
        let fetched = self.stage_fetch();

        let report = TickReport {
            retired,
            completed,
            executed,
            issued,
            dispatched,
            decoded,
            fetched,
            executing: self.execution_units.len(),
        };

        trace!(
            cycle = self.cycles,
            "{:?}\n{}\n{}\n{}",
            report,
            self.rob,
            self.reservation_stations,
            self.reg_file
        );

        self.cycles += 1;
        report
    }

    pub fn is_finished(&self) -> bool {
        self.insts_retired == self.insts.len()
    }

    pub fn cycles(&self) -> Cycle {
        self.cycles
    }

    pub fn insts(&self) -> &[InFlightInst] {
        &self.insts
    }

    pub fn rob(&self) -> &ReorderBuffer {
        &self.rob
    }

    pub fn reg_file(&self) -> &RegFile {
        &self.reg_file
    }

    pub fn reservation_stations(&self) -> &ReservationStations {
        &self.reservation_stations
    }

    /// Structural checks that hold at every cycle boundary.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.reg_file.check_invariants()?;

        if self.rob.len() > self.rob.capacity() {
            return Err(format!("ROB holds {} of {}", self.rob.len(), self.rob.capacity()));
        }

        for (expected, ent) in (self.insts_retired..).zip(self.rob.iter()) {
            if ent.inst != InstId(expected) {
                return Err(format!("ROB out of order: expected I#{expected}, found {}", ent.inst));
            }
        }

        let pending = (0..self.reg_file.num_phys())
            .filter(|&p| self.reg_file.get_phys(PhysReg(p)) == PrfEntry::Pending)
            .count();
        let producing = self
            .rob
            .iter()
            .filter(|ent| ent.t.is_some() && !ent.is_complete())
            .count();
        if pending != producing {
            return Err(format!(
                "{pending} registers pending but {producing} producers in flight"
            ));
        }

        Ok(())
    }

    fn stamp(&mut self, id: InstId, stage: Stage) {
        let inst = &mut self.insts[id.0];
        inst.stamps.set(stage, self.cycles);
        debug!(cycle = self.cycles, "{:<8} {}", stage.to_string(), inst);
    }

    // Retire completed instructions from the ROB head, in program order.
    fn stage_retire(&mut self) -> usize {
        let mut retired = 0;

        while retired < self.width {
            let Some(ent) = self.rob.try_pop() else {
                break;
            };

            let inst = &self.insts[ent.inst.0];
            debug_assert!(inst.completed);

            if let (Some(dst), Some(t)) = (inst.inst.dst, ent.t) {
                self.reg_file.commit_alias(dst, t);
            }
            if let Some(t_old) = ent.t_old {
                self.reg_file.release_phys(t_old);
            }

            self.stamp(ent.inst, Stage::Retire);
            self.insts_retired += 1;
            retired += 1;
        }

        retired
    }

    // Finish instructions whose latency has elapsed and wake up their consumers.
    fn stage_complete(&mut self) -> usize {
        let done = self.execution_units.take_complete(self.cycles, self.width);

        for &id in &done {
            let inst = &mut self.insts[id.0];
            inst.completed = true;

            if let Some(t) = inst.dst_phys {
                self.reservation_stations.broadcast(t);
                self.reg_file.set_ready(t);
            }

            self.rob.mark_complete(id);
            self.stamp(id, Stage::Complete);
        }

        done.len()
    }

    // Start issued instructions and hand their reservation stations back.
    fn stage_execute(&mut self) -> usize {
        let mut executed = 0;

        while executed < self.width {
            let Some(id) = self.execute_queue.try_pop() else {
                break;
            };

            let latency = match self.insts[id.0].rs.take() {
                Some(rs) => {
                    let station = self.reservation_stations.get_mut(rs);
                    station.free();
                    station.latency
                }
                None => unreachable!("{id} issued without a reservation station"),
            };

            self.insts[id.0].latency = Some(latency);
            self.execution_units.begin_execute(id, self.cycles, latency);
            self.stamp(id, Stage::Execute);
            executed += 1;
        }

        executed
    }

    fn stage_issue(&mut self) -> usize {
        let mut candidates = self
            .reservation_stations
            .ready()
            .filter(|&(_, id)| !self.insts[id.0].has_issued())
            .collect::<Vec<_>>();
        P::order(&mut candidates);

        let mut selected = Vec::with_capacity(self.width);
        for (_, id) in candidates {
            if selected.len() == self.width {
                break;
            }
            if selected.contains(&id) {
                continue;
            }
            if self.execute_queue.try_push(id).is_some() {
                break;
            }

            selected.push(id);
            self.stamp(id, Stage::Issue);
        }

        selected.len()
    }

    // Rename and allocate, strictly in order: the first instruction that
    // cannot get a ROB entry, a reservation station or a register stalls
    // everything behind it.
    fn stage_dispatch(&mut self) -> usize {
        let mut dispatched = 0;

        while dispatched < self.width {
            let Some(&id) = self.dispatch_queue.front() else {
                break;
            };
            let inst = self.insts[id.0].inst;

            if self.rob.is_full() {
                break;
            }
            let Some(rs) = self.reservation_stations.find_free(inst.fu) else {
                break;
            };
            let t = match inst.dst {
                Some(_) => match self.reg_file.allocate_phys() {
                    Some(t) => Some(t),
                    None => break,
                },
                None => None,
            };

            // Sources are read before the destination is remapped.
            let src_phys = inst.src.map(|src| src.map(|r| self.reg_file.get_alias(r)));
            let t_old = inst.dst.zip(t).map(|(dst, t)| self.reg_file.set_alias(dst, t));

            let operands = src_phys.map(|p| Operand::new(p, |p| self.reg_file.is_ready(p)));

            let rejected = self.rob.try_push(id, t, t_old);
            debug_assert_eq!(rejected, None);
            self.reservation_stations.get_mut(rs).allocate(id, operands);
            let popped = self.dispatch_queue.try_pop();
            debug_assert_eq!(popped, Some(id));

            let entry = &mut self.insts[id.0];
            entry.src_phys = src_phys;
            entry.dst_phys = t;
            entry.old_phys = t_old;
            entry.rs = Some(rs);

            self.stamp(id, Stage::Dispatch);
            dispatched += 1;
        }

        dispatched
    }

    fn stage_decode(&mut self) -> usize {
        let mut decoded = 0;

        while decoded < self.width {
            let Some(&id) = self.decode_queue.front() else {
                break;
            };
            // Leave it in place if dispatch is backed up.
            if self.dispatch_queue.try_push(id).is_some() {
                break;
            }

            let popped = self.decode_queue.try_pop();
            debug_assert_eq!(popped, Some(id));
            self.stamp(id, Stage::Decode);
            decoded += 1;
        }

        decoded
    }

    fn stage_fetch(&mut self) -> usize {
        let mut fetched = 0;

        while fetched < self.width && self.fetch_ptr < self.insts.len() {
            let id = InstId(self.fetch_ptr);
            if self.decode_queue.try_push(id).is_some() {
                break;
            }

            self.stamp(id, Stage::Fetch);
            self.fetch_ptr += 1;
            fetched += 1;
        }

        fetched
    }
}
