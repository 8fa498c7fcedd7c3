use std::fmt::Debug;

use crate::inst::{InstId, RsId};

/// Orders the ready reservation stations before the issue stage picks up to
/// `width` of them. Candidates arrive in reservation-station scan order.
pub trait IssuePolicy: Debug + Clone + Default {
    const NAME: &'static str;

    fn order(candidates: &mut [(RsId, InstId)]);
}

/// Fixed scan order over the reservation stations, regardless of age.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOrder;

/// Oldest instruction in program order first.
#[derive(Debug, Clone, Copy, Default)]
pub struct OldestFirst;

impl IssuePolicy for ScanOrder {
    const NAME: &'static str = "scan";

    fn order(_candidates: &mut [(RsId, InstId)]) {}
}

impl IssuePolicy for OldestFirst {
    const NAME: &'static str = "oldest";

    fn order(candidates: &mut [(RsId, InstId)]) {
        candidates.sort_by_key(|&(_, inst)| inst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<(RsId, InstId)> {
        vec![(RsId(0), InstId(7)), (RsId(1), InstId(2)), (RsId(3), InstId(5))]
    }

    #[test]
    fn test_scan_order_keeps_bank_order() {
        let mut c = candidates();
        ScanOrder::order(&mut c);
        assert_eq!(c, candidates());
    }

    #[test]
    fn test_oldest_first() {
        let mut c = candidates();
        OldestFirst::order(&mut c);
        assert_eq!(
            c.iter().map(|&(_, i)| i.0).collect::<Vec<_>>(),
            vec![2, 5, 7]
        );
    }
}
