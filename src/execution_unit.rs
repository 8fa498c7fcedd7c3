use crate::inst::{Cycle, InstId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Executing {
    inst: InstId,
    started: Cycle,
    latency: Cycle,
}

/// Instructions that have left execute but not yet completed.
#[derive(Debug, Clone, Default)]
pub struct ExecutionUnits {
    executing: Vec<Executing>,
}

impl ExecutionUnits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_execute(&mut self, inst: InstId, started: Cycle, latency: Cycle) {
        self.executing.push(Executing {
            inst,
            started,
            latency,
        });
    }

    /// Removes and returns, in order of entry, up to `max` instructions whose
    /// latency has elapsed by `cycle`.
    pub fn take_complete(&mut self, cycle: Cycle, max: usize) -> Vec<InstId> {
        let mut done = Vec::new();

        self.executing.retain(|e| {
            // `started` never exceeds `cycle`, so this cannot overflow.
            if done.len() < max && cycle - e.started >= e.latency {
                done.push(e.inst);
                false
            } else {
                true
            }
        });

        done
    }

    pub fn is_empty(&self) -> bool {
        self.executing.is_empty()
    }

    pub fn len(&self) -> usize {
        self.executing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_elapses() {
        let mut eu = ExecutionUnits::new();
        eu.begin_execute(InstId(0), 4, 2);

        assert!(eu.take_complete(4, 4).is_empty());
        assert!(eu.take_complete(5, 4).is_empty());
        assert_eq!(eu.take_complete(6, 4), vec![InstId(0)]);
        assert!(eu.is_empty());
    }

    #[test]
    fn test_width_limits_completion() {
        let mut eu = ExecutionUnits::new();
        eu.begin_execute(InstId(3), 0, 1);
        eu.begin_execute(InstId(1), 0, 1);
        eu.begin_execute(InstId(2), 0, 5);
        eu.begin_execute(InstId(0), 0, 1);

        assert_eq!(eu.take_complete(1, 2), vec![InstId(3), InstId(1)]);
        assert_eq!(eu.take_complete(2, 2), vec![InstId(0)]);
        assert_eq!(eu.len(), 1);
    }

    #[test]
    fn test_huge_latency_never_completes() {
        let mut eu = ExecutionUnits::new();
        eu.begin_execute(InstId(0), 3, Cycle::MAX);

        for cycle in 3..20 {
            assert!(eu.take_complete(cycle, 4).is_empty());
        }
        assert!(eu.take_complete(Cycle::MAX, 4).is_empty());
        assert_eq!(eu.len(), 1);
    }
}
