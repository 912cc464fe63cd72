use std::hint::black_box;
use std::io::Read;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use profcsv::record_queue::{QueueConfig, RecordQueue};
use profcsv::source::Resource;
use profcsv::{ChunkRange, CsvConsumer, MemoryResource, Profiler, RecordConsumer, ScanConfig};

fn payload(lines: usize) -> Vec<u8> {
    (0..lines)
        .flat_map(|i| format!("{},alpha,{},beta,\"q,uoted\"\n", i, i * 31).into_bytes())
        .collect()
}

fn bench_queue_next_record(c: &mut Criterion) {
    let resource = MemoryResource::new(payload(20_000));
    let range = ChunkRange::new(0, 0, resource.bytes().len() as u64);
    let mut group = c.benchmark_group("record_queue");
    group.throughput(Throughput::Bytes(range.len()));
    group.bench_function("next_record", |b| {
        b.iter(|| {
            let reader = resource.open_range(range).unwrap();
            let mut queue = RecordQueue::spawn(reader, QueueConfig::default());
            let mut records = 0usize;
            while let Some(record) = queue.next_record() {
                records += black_box(record).len();
            }
            black_box(records);
        });
    });
    group.bench_function("read_to_end", |b| {
        b.iter(|| {
            let reader = resource.open_range(range).unwrap();
            let mut queue = RecordQueue::spawn(reader, QueueConfig::default());
            let mut out = Vec::with_capacity(range.len() as usize);
            queue.read_to_end(&mut out).unwrap();
            black_box(out);
        });
    });
    group.finish();
}

fn bench_csv_consumer(c: &mut Criterion) {
    let data = payload(20_000);
    let consumer = CsvConsumer::default();
    c.bench_function("csv_field_count", |b| {
        b.iter(|| {
            let mut fields = 0usize;
            for record in data.split_inclusive(|&byte| byte == b'\n') {
                fields += consumer.field_count(black_box(record)).unwrap().unwrap_or(0);
            }
            black_box(fields);
        });
    });
}

fn bench_profile_workers(c: &mut Criterion) {
    let resource = MemoryResource::new(payload(100_000));
    let consumer = CsvConsumer::default();
    let mut group = c.benchmark_group("profile");
    group.throughput(Throughput::Bytes(resource.bytes().len() as u64));
    for workers in [1, 4, 16] {
        let profiler = Profiler::new(ScanConfig::default().with_workers(workers));
        group.bench_function(format!("workers_{}", workers), |b| {
            b.iter(|| black_box(profiler.profile(&resource, &consumer).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_queue_next_record,
    bench_csv_consumer,
    bench_profile_workers
);
criterion_main!(benches);
