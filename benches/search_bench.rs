use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hexdoc::{Document, FindDirection, FindMode, FindOptions, FindValue};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

const SIZE: usize = 8 * 1024 * 1024;

fn sample_document() -> Document {
    let mut data: Vec<u8> = (0..SIZE).map(|i| (i * 31 % 251) as u8).collect();
    let needle = b"Needle in the Haystack";
    let at = SIZE - 4096;
    data[at..at + needle.len()].copy_from_slice(needle);
    Document::from_resident(data)
}

fn find_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");
    group.measurement_time(Duration::from_secs(10));

    let doc = sample_document();
    let needle = FindValue::from("Needle in the Haystack");

    group.bench_function("text_case_sensitive", |b| {
        let options = FindOptions::new(FindMode::Text, FindDirection::Forward).case_sensitive(true);
        b.iter(|| black_box(doc.find(&needle, 0, &options)))
    });

    group.bench_function("text_case_folded", |b| {
        let options = FindOptions::new(FindMode::Text, FindDirection::Forward);
        b.iter(|| black_box(doc.find(&needle, 0, &options)))
    });

    group.bench_function("backward", |b| {
        let options = FindOptions::new(FindMode::Text, FindDirection::Backward).case_sensitive(true);
        b.iter(|| black_box(doc.find(&needle, SIZE, &options)))
    });

    group.finish();
}

fn pattern_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let doc = sample_document();
    let options = FindOptions::new(FindMode::Hex, FindDirection::Forward);

    for pattern in ["4E 65 65 64", "4E ?? 65 64 6C", "4E .. 48 61 79"] {
        let value = FindValue::from(pattern);
        group.bench_with_input(BenchmarkId::new("hex", pattern), &value, |b, value| {
            b.iter(|| black_box(doc.find(value, 0, &options)))
        });
    }

    group.finish();
}

fn edited_mapped_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("edited_mapped");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&sample_document().read(0, SIZE)).unwrap();
    file.flush().unwrap();

    let mut doc = Document::from_mapped_file(file.path()).unwrap();
    for i in 0..200 {
        doc.replace_byte(i * 4096, 0xAA);
    }
    let options = FindOptions::new(FindMode::Hex, FindDirection::Forward);
    let value = FindValue::from("4E 65 65 64");

    group.bench_function("hex_after_200_edits", |b| {
        b.iter(|| black_box(doc.find(&value, 0, &options)))
    });

    group.finish();
}

criterion_group!(benches, find_benchmark, pattern_benchmark, edited_mapped_benchmark);
criterion_main!(benches);
