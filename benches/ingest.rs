use blockwatch::data::Registry;
use blockwatch::{parse_line, Ingestor, Record};
use chrono::TimeDelta;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const STATS_LINE: &str = "2017-02-15T12:57:53.000000-08:00 change peer-device name:r0 peer-node-id:1 \
conn-name:peer volume:0 replication:Established peer-disk:UpToDate resync-suspended:no \
received:1024 sent:2048 out-of-sync:0 pending:0 unacked:0";

/// One statistics dump for `resources` resources with two peers and two volumes each.
fn statistics_dump(resources: usize, round: i64) -> Vec<Record> {
    let mut lines = Vec::new();
    let ts = format!("2017-02-15T12:{:02}:{:02}.000000-08:00", 57 + round / 60, round % 60);
    for r in 0..resources {
        lines.push(format!("{ts} exists resource name:r{r} role:Primary suspended:no"));
        for peer in ["alice", "bob"] {
            lines.push(format!(
                "{ts} exists connection name:r{r} conn-name:{peer} connection:Connected congested:no"
            ));
        }
        for vol in 0..2 {
            lines.push(format!(
                "{ts} exists device name:r{r} volume:{vol} disk:UpToDate read:{} written:{} \
                 upper-pending:0 lower-pending:1",
                round * 100,
                round * 400
            ));
            for peer in ["alice", "bob"] {
                lines.push(format!(
                    "{ts} exists peer-device name:r{r} conn-name:{peer} volume:{vol} \
                     replication:Established sent:{} out-of-sync:0",
                    round * 400
                ));
            }
        }
    }
    lines
        .iter()
        .filter_map(|l| parse_line(l).ok().flatten())
        .collect()
}

/// Benchmark tokenizing a single statistics line
fn bench_parse_line(c: &mut Criterion) {
    c.bench_function("parse_line", |b| {
        b.iter(|| parse_line(black_box(STATS_LINE)));
    });
}

/// Benchmark applying full statistics dumps of growing clusters
fn bench_apply_dump(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_dump");

    for resources in [1usize, 10, 100].iter() {
        let dumps: Vec<Vec<Record>> = (0..10).map(|round| statistics_dump(*resources, round)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(resources), &dumps, |b, dumps| {
            b.iter(|| {
                let mut registry = Registry::default();
                let mut ingestor = Ingestor::default();
                for dump in dumps {
                    for record in dump {
                        ingestor.apply(&mut registry, black_box(record));
                    }
                }
                registry
            });
        });
    }
    group.finish();
}

/// Benchmark taking a snapshot of a populated registry
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for resources in [10usize, 100].iter() {
        let mut registry = Registry::default();
        let mut ingestor = Ingestor::default();
        for round in 0..5 {
            for record in statistics_dump(*resources, round) {
                ingestor.apply(&mut registry, &record);
            }
        }

        group.bench_with_input(BenchmarkId::from_parameter(resources), &registry, |b, registry| {
            b.iter(|| registry.snapshot(black_box(TimeDelta::seconds(30))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse_line, bench_apply_dump, bench_snapshot);
criterion_main!(benches);
