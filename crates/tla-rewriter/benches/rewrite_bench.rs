//! Rewriter benchmarks.
//!
//! Measures the full analyze/bound/apply path on modules with and without
//! top-level awaits.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tla_rewriter::context::ModuleAnalysis;
use tla_rewriter::rewrite_module;

/// Module with exported and bare top-level awaits.
const TOP_LEVEL_CODE: &str = r#"
import { connect } from "./db";

export const db = await connect(process.env.DATABASE_URL);
export const config = await loadConfig();

await db.migrate();

const users = await db.query("select * from users");
console.log(`loaded ${users.length} users`);
"#;

/// Module whose awaits are all inside callables.
const FUNCTION_CODE: &str = r#"
export async function handler(request) {
  const body = await request.json();
  const result = await process(body);
  return new Response(JSON.stringify(result));
}

class Cache {
  async get(key) {
    return (await this.store.get(key)) ?? null;
  }
}

const retry = async (fn, attempts = 3) => {
  for (let i = 0; i < attempts; i++) {
    try { return await fn(); } catch (e) { if (i === attempts - 1) throw e; }
  }
};
"#;

fn scaled(code: &str, copies: usize) -> String {
    let mut out = String::with_capacity(code.len() * copies);
    for _ in 0..copies {
        out.push_str(code);
    }
    out
}

fn bench_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite_module");
    for copies in [1usize, 10, 100] {
        let top_level = scaled(TOP_LEVEL_CODE, copies);
        group.bench_with_input(
            BenchmarkId::new("top_level", copies),
            &top_level,
            |b, code| b.iter(|| rewrite_module(black_box(code), "bench.ts")),
        );

        let functions = scaled(FUNCTION_CODE, copies);
        group.bench_with_input(
            BenchmarkId::new("functions_only", copies),
            &functions,
            |b, code| b.iter(|| rewrite_module(black_box(code), "bench.ts")),
        );
    }
    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let code = scaled(FUNCTION_CODE, 100);
    c.bench_function("module_analysis", |b| {
        b.iter(|| ModuleAnalysis::analyze(black_box(&code)))
    });
}

criterion_group!(benches, bench_rewrite, bench_analysis);
criterion_main!(benches);
