//! Parser and tokenizer benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use esparse::{ParseOptions, TokenizeOptions};

const SAMPLE_SOURCE: &str = r#"
// Sample JavaScript code for benchmarking
function fibonacci(n) {
    if (n <= 1) return n;
    return fibonacci(n - 1) + fibonacci(n - 2);
}

class Calculator {
    constructor() {
        this.result = 0;
    }

    add(x, y) {
        return x + y;
    }

    get value() {
        return this.result ?? 0;
    }

    async fetchData(url) {
        const response = await fetch(url);
        return response?.body?.json();
    }
}

const calc = new Calculator();
const numbers = [1, 2, 3, 4, 5].map(n => n * 2);
const { a, b, ...rest } = { a: 1, b: 2, c: 3, d: 4 };
const template = `Hello ${name}, you have ${count} messages`;
const pattern = /^[a-z]+\d*$/gi;

for (const [key, value] of Object.entries(rest)) {
    if (key in calc || value instanceof Object) continue;
}

export { Calculator, fibonacci };
export default calc;
"#;

const JSX_SOURCE: &str = r#"
const App = ({ items, title }) => (
    <main className="app">
        <h1>{title} &amp; more</h1>
        <ul>
            {items.map(item => <li key={item.id} {...item}>{item.label}</li>)}
        </ul>
        <>
            <svg:rect width="10" />
        </>
    </main>
);
"#;

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    let module = ParseOptions::new().with_module();
    group.bench_function("module", |b| {
        b.iter(|| esparse::parse(black_box(SAMPLE_SOURCE), &module));
    });

    let full = ParseOptions::new()
        .with_module()
        .with_range(true)
        .with_loc(true)
        .with_tokens(true)
        .with_attach_comment(true);
    group.bench_function("module_with_locations", |b| {
        b.iter(|| esparse::parse(black_box(SAMPLE_SOURCE), &full));
    });

    group.finish();

    let mut group = c.benchmark_group("jsx");
    group.throughput(Throughput::Bytes(JSX_SOURCE.len() as u64));
    let jsx = ParseOptions::new().with_jsx(true);
    group.bench_function("component", |b| {
        b.iter(|| esparse::parse(black_box(JSX_SOURCE), &jsx));
    });
    group.finish();
}

fn bench_tokenizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenizer");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    let options = TokenizeOptions::default();
    group.bench_function("sample", |b| {
        b.iter(|| esparse::tokenize(black_box(SAMPLE_SOURCE), &options));
    });

    group.finish();
}

criterion_group!(benches, bench_parser, bench_tokenizer);
criterion_main!(benches);
