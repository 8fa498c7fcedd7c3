use crate::{
    inst::{InstId, PhysReg},
    queue::Queue,
};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobStatus {
    Executing,
    Executed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobEntry {
    pub inst: InstId,
    pub t: Option<PhysReg>,
    pub t_old: Option<PhysReg>,
    status: RobStatus,
}

#[derive(Debug, Clone)]
pub struct ReorderBuffer {
    rob: Queue<RobEntry>,
}

impl ReorderBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            rob: Queue::new(capacity),
        }
    }

    pub fn is_full(&self) -> bool {
        self.rob.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.rob.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rob.len()
    }

    pub fn capacity(&self) -> usize {
        self.rob.capacity()
    }

    #[must_use]
    pub fn try_push(&mut self, inst: InstId, t: Option<PhysReg>, t_old: Option<PhysReg>) -> Option<InstId> {
        self.rob
            .try_push(RobEntry {
                inst,
                t,
                t_old,
                status: RobStatus::Executing,
            })
            .map(|ent| ent.inst)
    }

    /// Pops the head, but only once it has finished executing.
    pub fn try_pop(&mut self) -> Option<RobEntry> {
        if self
            .rob
            .front()
            .map(|ent| ent.status == RobStatus::Executed)
            .unwrap_or(false)
        {
            self.rob.try_pop()
        } else {
            None
        }
    }

    pub fn mark_complete(&mut self, inst: InstId) {
        if let Some(ent) = self.rob.iter_mut().find(|ent| ent.inst == inst) {
            ent.status = RobStatus::Executed;
        } else {
            debug_assert!(false, "no entry for {inst} in ROB");
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RobEntry> + '_ {
        self.rob.iter()
    }
}

impl RobEntry {
    pub fn is_complete(&self) -> bool {
        self.status == RobStatus::Executed
    }
}

impl fmt::Display for ReorderBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ROB ({}/{}): [", self.len(), self.capacity())?;
        for ent in self.rob.iter() {
            let show = |p: Option<PhysReg>| p.map_or_else(|| "-".to_owned(), |p| p.to_string());
            writeln!(
                f,
                "\t{} T={} Told={} {:?}",
                ent.inst,
                show(ent.t),
                show(ent.t_old),
                ent.status
            )?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        let mut rob = ReorderBuffer::new(2);
        assert_eq!(rob.try_push(InstId(0), None, None), None);
        assert_eq!(rob.try_push(InstId(1), Some(PhysReg(5)), Some(PhysReg(1))), None);
        assert!(rob.is_full());
        assert_eq!(rob.try_push(InstId(2), None, None), Some(InstId(2)));
        assert_eq!(rob.len(), 2);
    }

    #[test]
    fn test_head_blocks_retire() {
        let mut rob = ReorderBuffer::new(4);
        assert_eq!(rob.try_push(InstId(0), None, None), None);
        assert_eq!(rob.try_push(InstId(1), Some(PhysReg(5)), Some(PhysReg(1))), None);

        rob.mark_complete(InstId(1));
        assert_eq!(rob.try_pop(), None);

        rob.mark_complete(InstId(0));
        assert_eq!(rob.try_pop().map(|e| e.inst), Some(InstId(0)));

        let ent = rob.try_pop().unwrap();
        assert_eq!(ent.inst, InstId(1));
        assert_eq!(ent.t, Some(PhysReg(5)));
        assert_eq!(ent.t_old, Some(PhysReg(1)));
        assert!(rob.is_empty());
    }
}
