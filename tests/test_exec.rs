use strum::IntoEnumIterator;
use tomasulo::{
    config::{Config, FuConfig},
    cpu::{Cpu, ExecResult},
    error::SimError,
    inst::{FuType, Stage},
    issue::{OldestFirst, ScanOrder},
    out_of_order::OutOfOrder,
    parse_and_exec,
};

fn exec_trace<C: Cpu>(name: &str, config: &Config) -> ExecResult {
    let contents = std::fs::read_to_string(format!("traces/{name}.trace")).unwrap();
    parse_and_exec::<C>(&contents, config).unwrap()
}

fn at(res: &ExecResult, inst: usize, stage: Stage) -> u64 {
    res.timelines[inst][stage as usize]
}

fn check_timelines(res: &ExecResult, width: usize) {
    for (i, t) in res.timelines.iter().enumerate() {
        assert!(
            t.windows(2).all(|w| w[0] <= w[1]),
            "instruction {i} has non-monotonic timeline {t:?}"
        );
        assert!(t[Stage::Execute as usize] > t[Stage::Issue as usize]);
        assert!(t[Stage::Retire as usize] > t[Stage::Complete as usize]);
    }

    for stage in [Stage::Fetch, Stage::Decode, Stage::Dispatch, Stage::Retire] {
        for pair in res.timelines.windows(2) {
            assert!(
                pair[0][stage as usize] <= pair[1][stage as usize],
                "{stage} out of program order"
            );
        }

        let mut per_cycle = std::collections::HashMap::new();
        for t in &res.timelines {
            *per_cycle.entry(t[stage as usize]).or_insert(0) += 1;
        }
        assert!(
            per_cycle.values().all(|&n| n <= width),
            "more than {width} instructions passed {stage} in one cycle"
        );
    }
}

#[generic_tests::define]
mod t {
    use super::*;

    #[test]
    fn test_single_alu<C: Cpu>() {
        let res = exec_trace::<C>("single", &Config::default());
        assert_eq!(res.timelines, vec![[0, 1, 2, 3, 4, 5, 6]]);
        assert_eq!(res.insts_retired, 1);
        assert_eq!(res.cycles_taken, 7);
    }

    #[test]
    fn test_raw_dependency<C: Cpu>() {
        let res = exec_trace::<C>("chain", &Config::default());
        check_timelines(&res, 4);

        for i in 1..res.timelines.len() {
            assert!(at(&res, i, Stage::Issue) >= at(&res, i - 1, Stage::Complete));
        }

        // The load takes two cycles.
        assert_eq!(at(&res, 3, Stage::Complete) - at(&res, 3, Stage::Execute), 2);
    }

    #[test]
    fn test_independent<C: Cpu>() {
        let res = exec_trace::<C>("independent", &Config::default());
        check_timelines(&res, 4);
        assert_eq!(res.insts_retired, 8);

        // Two ALU stations, so at most two executions start per cycle.
        for t in &res.timelines {
            let started = res
                .timelines
                .iter()
                .filter(|o| o[Stage::Execute as usize] == t[Stage::Execute as usize])
                .count();
            assert!(started <= 2);
        }
    }

    #[test]
    fn test_mixed<C: Cpu>() {
        for width in 1..=4 {
            let config = Config {
                width,
                ..Config::default()
            };
            let res = exec_trace::<C>("mixed", &config);
            check_timelines(&res, width);
            assert_eq!(res.insts_retired, 15);
        }
    }

    #[test]
    fn test_retire_waits_for_predecessors<C: Cpu>() {
        let res = exec_trace::<C>("mixed", &Config::default());
        for i in 0..res.timelines.len() {
            assert!(at(&res, i, Stage::Retire) > at(&res, i, Stage::Complete));
            for j in 0..i {
                assert!(at(&res, i, Stage::Retire) >= at(&res, j, Stage::Retire));
            }
        }
    }

    #[test]
    fn test_tight_resources<C: Cpu>() {
        let config = Config {
            arch_regs: 8,
            phys_regs: 9,
            rob_entries: 2,
            width: 2,
            ..Config::default()
        };
        let res = exec_trace::<C>("pressure", &config);
        check_timelines(&res, 2);
        assert_eq!(res.insts_retired, 16);

        // With two ROB entries no instruction dispatches before the one two
        // places ahead of it has retired.
        for i in 2..res.timelines.len() {
            assert!(at(&res, i, Stage::Dispatch) >= at(&res, i - 2, Stage::Retire));
        }
    }

    #[test]
    fn test_slow_units<C: Cpu>() {
        let mut config = Config::default();
        let _ = config
            .func_units
            .insert(FuType::Alu, FuConfig { count: 1, latency: 3 });
        let res = exec_trace::<C>("independent", &config);
        check_timelines(&res, 4);
        for t in &res.timelines {
            assert_eq!(t[Stage::Complete as usize] - t[Stage::Execute as usize], 3);
        }
    }

    #[test]
    fn test_missing_station_is_config_error<C: Cpu>() {
        let mut config = Config::default();
        let _ = config.func_units.remove(&FuType::Store);
        let contents = std::fs::read_to_string("traces/chain.trace").unwrap();
        assert!(matches!(
            parse_and_exec::<C>(&contents, &config),
            Err(SimError::Config(_))
        ));
    }

    #[instantiate_tests(<OutOfOrder<ScanOrder>>)]
    mod scan_order {}

    #[instantiate_tests(<OutOfOrder<OldestFirst>>)]
    mod oldest_first {}
}

#[test]
fn test_stage_order_matches_timeline() {
    let res = exec_trace::<OutOfOrder>("single", &Config::default());
    for (i, stage) in Stage::iter().enumerate() {
        assert_eq!(at(&res, 0, stage), i as u64);
    }
}
