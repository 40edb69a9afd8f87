use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use firepickle::headers::{decode_headers, encode_headers};
use firepickle::record::{ExcInfo, Frame, Level, LogRecord, Payload};
use firepickle::registry::{Class, Registry};
use firepickle::{
    decode, decode_with_registry, encode, encode_with_options, to_string, value, HeaderOptions,
    ObjectRef, PickleOptions, RecordOptions, Value,
};
use serde::Serialize;

#[derive(Serialize, Clone)]
struct Request {
    method: String,
    path: String,
    status: u16,
    headers: Vec<(String, String)>,
}

fn sample_record(i: u32) -> Value {
    value!({
        "level": "info",
        "message": (format!("request {} served", i)),
        "args": ((i64::from(i)), "GET", "/index"),
        "lineno": (i64::from(i % 200))
    })
}

fn linked_things(len: usize) -> Value {
    let head = ObjectRef::fields("bench.Node", [("index", Value::from(0))]);
    let mut tail = head.clone();
    for i in 1..len {
        let next = ObjectRef::fields("bench.Node", [("index", Value::from(i as i64))]);
        next.set("prev", Value::Object(tail.clone()));
        tail.set("next", Value::Object(next.clone()));
        tail = next;
    }
    tail.set("next", Value::Object(head.clone()));
    Value::Object(head)
}

fn benchmark_encode_record(c: &mut Criterion) {
    let record = sample_record(1);

    c.bench_function("encode_record", |b| b.iter(|| encode(black_box(&record))));

    c.bench_function("encode_record_oneway", |b| {
        b.iter(|| encode_with_options(black_box(&record), PickleOptions::oneway()))
    });
}

fn benchmark_decode_record(c: &mut Criterion) {
    let json = encode(&sample_record(1)).unwrap();

    c.bench_function("decode_record", |b| b.iter(|| decode(black_box(&json))));
}

fn benchmark_encode_logs(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_logs");

    for size in [10, 50, 100, 500].iter() {
        let logs = Value::List((0..*size).map(sample_record).collect());

        group.bench_with_input(BenchmarkId::from_parameter(size), &logs, |b, logs| {
            b.iter(|| encode(black_box(logs)))
        });
    }
    group.finish();
}

fn benchmark_decode_logs(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_logs");

    for size in [10, 50, 100, 500].iter() {
        let logs = Value::List((0..*size).map(sample_record).collect());
        let json = encode(&logs).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &json, |b, json| {
            b.iter(|| decode(black_box(json)))
        });
    }
    group.finish();
}

fn benchmark_cyclic_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("cyclic_graph");
    let mut registry = Registry::new();
    registry.register(Class::fields("bench.Node"));

    // Each node nests one level deeper; stay under the JSON parser's recursion limit.
    for size in [10, 50, 100].iter() {
        let graph = linked_things(*size);
        let json = encode(&graph).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", size), &graph, |b, graph| {
            b.iter(|| encode(black_box(graph)))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &json, |b, json| {
            b.iter(|| decode_with_registry(black_box(json), &registry))
        });
    }
    group.finish();
}

fn benchmark_max_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_depth");
    let graph = linked_things(1000);

    for depth in [2, 8, 32].iter() {
        let options = PickleOptions::new().with_max_depth(*depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &options, |b, options| {
            b.iter(|| encode_with_options(black_box(&graph), *options))
        });
    }
    group.finish();
}

fn benchmark_serde_struct(c: &mut Criterion) {
    let request = Request {
        method: "GET".to_string(),
        path: "/search".to_string(),
        status: 200,
        headers: vec![
            ("Host".to_string(), "localhost".to_string()),
            ("Accept".to_string(), "text/html".to_string()),
        ],
    };

    let mut group = c.benchmark_group("comparison");

    group.bench_function("firepickle_serialize", |b| {
        b.iter(|| to_string(black_box(&request)))
    });

    group.bench_function("json_serialize", |b| {
        b.iter(|| serde_json::to_string(black_box(&request)))
    });

    group.finish();
}

fn benchmark_headers(c: &mut Criterion) {
    let created = Utc.with_ymd_and_hms(2009, 3, 1, 12, 30, 5).unwrap();
    let records: Vec<LogRecord> = (0..20)
        .map(|i| {
            LogRecord::new(Level::Warning, format!("slow query {}", i))
                .with_created(created)
                .with_args(value!((i,)))
                .with_exc_info(
                    ExcInfo::new("Timeout", "query took too long").with_frame(
                        Frame::new("db.rs", 88, "query").with_local("sql", Value::from("SELECT 1")),
                    ),
                )
        })
        .collect();
    let payload = Payload::from_records(&records, &RecordOptions::new());
    let options = HeaderOptions::new();
    let headers = encode_headers(&payload, &options);

    c.bench_function("encode_headers", |b| {
        b.iter(|| encode_headers(black_box(&payload), &options))
    });

    c.bench_function("decode_headers", |b| {
        b.iter(|| decode_headers(black_box(headers.clone())))
    });
}

criterion_group!(
    benches,
    benchmark_encode_record,
    benchmark_decode_record,
    benchmark_encode_logs,
    benchmark_decode_logs,
    benchmark_cyclic_graph,
    benchmark_max_depth,
    benchmark_serde_struct,
    benchmark_headers
);
criterion_main!(benches);
