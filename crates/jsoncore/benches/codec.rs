//! Benchmark: text and Smile codecs over the same document.
#![allow(missing_docs)]

use std::{fmt::Write, time::Duration};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use jsoncore::{CodecFactory, SmileOptions, TokenStream, transcode};

/// Array of `records` small objects with repeating field names and a few
/// repeating string values.
fn make_payload(records: usize) -> String {
    let mut s = String::from("[");
    for i in 0..records {
        if i > 0 {
            s.push(',');
        }
        write!(
            s,
            r#"{{"id":{i},"kind":"{}","score":{}.5,"active":{},"tags":["t{}","shared"]}}"#,
            ["alpha", "beta", "gamma"][i % 3],
            i % 100,
            i % 2 == 0,
            i % 7
        )
        .unwrap();
    }
    s.push(']');
    s
}

fn count_tokens(stream: &mut impl TokenStream) -> usize {
    let mut count = 0;
    while stream.next_token().unwrap().is_some() {
        count += 1;
    }
    count
}

fn to_smile(factory: &CodecFactory, json: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut parser = factory.create_parser_from_str(json);
    let mut generator = factory.create_smile_generator(&mut out);
    transcode(&mut parser, &mut generator).unwrap();
    drop(generator);
    out
}

fn bench_codecs(c: &mut Criterion) {
    let factory = CodecFactory::new().with_smile_options(SmileOptions {
        shared_values: true,
        ..SmileOptions::default()
    });

    let mut group = c.benchmark_group("codec");
    for &records in &[10usize, 1_000] {
        let json = make_payload(records);
        let smile = to_smile(&factory, &json);

        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_json", records), &json, |b, json| {
            b.iter(|| black_box(count_tokens(&mut factory.create_parser_from_str(json))));
        });
        group.bench_with_input(BenchmarkId::new("json_to_smile", records), &json, |b, json| {
            b.iter(|| black_box(to_smile(&factory, json)));
        });

        group.throughput(Throughput::Bytes(smile.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_smile", records), &smile, |b, smile| {
            b.iter(|| {
                black_box(count_tokens(
                    &mut factory.create_smile_parser_from_slice(smile),
                ))
            });
        });
    }
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(3))
            .measurement_time(Duration::from_secs(5));
    }
    c
}

criterion_group! { name = benches; config = criterion(); targets = bench_codecs }
criterion_main!(benches);
