use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tomasulo::{
    config::Config,
    cpu::Cpu,
    inst::{ArchReg, FuType, Inst},
    issue::{OldestFirst, ScanOrder},
    out_of_order::OutOfOrder,
    program::Program,
};

/// Interleaves a long dependency chain with independent loads and stores so
/// every structure sees pressure.
fn workload(n: usize) -> Program {
    (0..n)
        .map(|i| {
            let r = |k: usize| Some(ArchReg(k % 32));
            match i % 4 {
                0 | 1 => Inst::new(FuType::Alu, r(i), r(i + 7), r(i + 1)),
                2 => Inst::new(FuType::Load, r(i), None, r(i + 13)),
                _ => Inst::new(FuType::Store, r(i), r(i + 1), None),
            }
        })
        .collect::<Vec<_>>()
        .into()
}

fn run<C: Cpu>(prog: Program, config: &Config) -> u64 {
    C::new(prog, config).unwrap().exec_all().unwrap().cycles_taken
}

fn long_trace(c: &mut Criterion) {
    let prog = workload(20_000);
    let config = Config::default();

    let mut group = c.benchmark_group("long_trace");
    group.sample_size(10);
    group.bench_function("scan order 20000", |b| {
        b.iter(|| run::<OutOfOrder<ScanOrder>>(black_box(prog.clone()), &config))
    });
    group.bench_function("oldest first 20000", |b| {
        b.iter(|| run::<OutOfOrder<OldestFirst>>(black_box(prog.clone()), &config))
    });
    group.finish();
}

criterion_group!(benches, long_trace);
criterion_main!(benches);
