use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use olepack::ole::{OleBlob, OleBlobBuilder};
use olepack::page::{IdentityCodec, PageBuffers, PageCodec, decode_page_in_place};

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

fn build_simple(data: &[u8]) -> Vec<u8> {
    OleBlobBuilder::new()
        .file_name("bench.bin")
        .file_path("C:\\data\\bench.bin")
        .simple_package_bytes(data.to_vec())
        .build()
        .unwrap()
        .into_bytes()
        .unwrap()
}

fn bench_build_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("build_simple_package");
    for size in [4 * 1024usize, 256 * 1024, 4 * 1024 * 1024] {
        let data = gen_data(size, 1);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(build_simple(black_box(&data))));
        });
    }
    g.finish();
}

fn bench_parse_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("parse_content");
    for size in [4 * 1024usize, 256 * 1024, 4 * 1024 * 1024] {
        let stored = build_simple(&gen_data(size, 2));
        g.throughput(Throughput::Bytes(stored.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let blob = OleBlob::from_bytes(black_box(stored.clone()));
                black_box(blob.payload().unwrap().map(<[u8]>::len));
            });
        });
    }
    g.finish();
}

fn bench_page_decode(c: &mut Criterion) {
    let mut g = c.benchmark_group("page_decode_identity");
    let page_size = 4096usize;
    let mut page = gen_data(page_size, 3);
    let mut scratch = Vec::with_capacity(page_size);
    g.throughput(Throughput::Bytes(page_size as u64));
    g.bench_function("in_place", |b| {
        b.iter(|| decode_page_in_place(&IdentityCodec, black_box(&mut page), 7, &mut scratch).unwrap());
    });
    let input = gen_data(page_size, 4);
    let mut output = vec![0u8; page_size];
    g.bench_function("split", |b| {
        b.iter(|| {
            IdentityCodec
                .decode_page(
                    PageBuffers::Split {
                        input: black_box(&input),
                        output: &mut output,
                    },
                    7,
                )
                .unwrap()
        });
    });
    g.finish();
}

criterion_group!(benches, bench_build_speed, bench_parse_speed, bench_page_decode);
criterion_main!(benches);
