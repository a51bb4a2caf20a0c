use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use mailcat::model::RawEmailInput;
use mailcat::Resolver;

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn bench_resolve_multipart(c: &mut Criterion) {
    let resolver = Resolver::default();
    let input = RawEmailInput::FullMessage(load_fixture("nested.eml"));

    c.bench_function("resolve_nested_multipart", |b| {
        b.iter(|| resolver.resolve(&input))
    });
}

fn bench_resolve_base64(c: &mut Criterion) {
    let resolver = Resolver::default();
    let input = RawEmailInput::FullMessage(load_fixture("base64_message.txt"));

    c.bench_function("resolve_whole_base64", |b| {
        b.iter(|| resolver.resolve(&input))
    });
}

fn bench_text_to_html(c: &mut Criterion) {
    let text = load_fixture("plain.txt").repeat(200);

    c.bench_function("text_to_html", |b| {
        b.iter(|| mailcat::render::html::text_to_html(&text))
    });
}

criterion_group!(
    benches,
    bench_resolve_multipart,
    bench_resolve_base64,
    bench_text_to_html
);
criterion_main!(benches);
