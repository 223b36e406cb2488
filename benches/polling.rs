use asyncserial::port::{AsyncSerial, MockSerialPort, YieldScheduler};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

fn adapter(mock: &MockSerialPort) -> AsyncSerial<MockSerialPort> {
    AsyncSerial::new(mock.clone(), Arc::new(YieldScheduler)).expect("mock adapter")
}

/// Exact-count reads with the input arriving in 16 byte fragments.
pub fn bench_fragmented_read(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("fragmented_read");

    for size in [64usize, 256, 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let mock = MockSerialPort::new("BENCH0");
                for piece in vec![0x5A; size].chunks(16) {
                    mock.enqueue_fragment(piece);
                }
                let mut port = adapter(&mock);
                black_box(port.read(size).await.expect("read"));
            })
        });
    }
    group.finish();
}

/// Line assembly over a loopback that transmits 8 bytes per poll.
pub fn bench_readline(c: &mut Criterion) {
    let rt = runtime();
    let line = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

    c.bench_function("readline_loopback", |b| {
        b.to_async(&rt).iter(|| async {
            let mock = MockSerialPort::loopback("BENCH0");
            mock.set_tx_chunk(8);
            let mut port = adapter(&mock);
            port.write(line, false).await.expect("write");
            black_box(port.readline().await.expect("readline"));
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_fragmented_read, bench_readline
}
criterion_main!(benches);
