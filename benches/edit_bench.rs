use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use query_builder::ast::{Combinator, Node, Query, Rule, RuleGroup, RulePatch, Value};
use query_builder::edit;
use query_builder::ids::SequentialIds;
use query_builder::path::find_node_by_id;
use query_builder::reorder::move_node;
use std::hint::black_box;

// 构造一棵宽而深的规则树: 每层 width 个规则加一个子分组
fn build_tree(width: usize, depth: usize) -> Query {
    fn level(prefix: &str, width: usize, depth: usize) -> RuleGroup {
        let mut rules: Vec<Node> = (0..width)
            .map(|i| {
                Rule::new(format!("{}-r{}", prefix, i), "status", "equal")
                    .with_value(Value::text("Open"))
                    .into()
            })
            .collect();
        if depth > 0 {
            let child = format!("{}-g", prefix);
            rules.push(level(&child, width, depth - 1).into());
        }
        RuleGroup::new(prefix, Combinator::And, rules)
    }
    level("root", width, depth).into_query()
}

// 最深一层分组的路径
fn deepest_group(width: usize, depth: usize) -> Vec<usize> {
    vec![width; depth]
}

fn benchmark_primitives(c: &mut Criterion) {
    let shapes = vec![("narrow", 4, 4), ("wide", 100, 4), ("deep", 4, 32)];
    let mut group = c.benchmark_group("edit_primitives");

    for (name, width, depth) in shapes {
        let tree = build_tree(width, depth);
        let deepest = deepest_group(width, depth);
        let mut deepest_rule = deepest.clone();
        deepest_rule.push(0);

        group.bench_with_input(BenchmarkId::new("add", name), &tree, |b, tree| {
            b.iter(|| edit::add(black_box(tree), black_box(&deepest), Rule::new("new", "age", "greater")))
        });

        group.bench_with_input(BenchmarkId::new("remove", name), &tree, |b, tree| {
            b.iter(|| edit::remove(black_box(tree), black_box(&deepest_rule)))
        });

        let patch = RulePatch {
            value: Some(Some(Value::text("Closed"))),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("update_rule", name), &tree, |b, tree| {
            b.iter(|| edit::update_rule(black_box(tree), black_box(&deepest_rule), &patch))
        });

        let ids = SequentialIds::new("copy");
        group.bench_with_input(BenchmarkId::new("duplicate_subtree", name), &tree, |b, tree| {
            b.iter(|| edit::duplicate(black_box(tree), black_box(&[width]), &ids))
        });

        group.bench_with_input(BenchmarkId::new("toggle_lock_root", name), &tree, |b, tree| {
            b.iter(|| edit::toggle_lock(black_box(tree), &[]))
        });
    }

    group.finish();
}

fn benchmark_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("move");
    let (width, depth) = (50, 8);
    let tree = build_tree(width, depth);
    let mut into_deepest = deepest_group(width, depth);
    into_deepest.push(0);

    group.bench_function("flat_reorder", |b| {
        b.iter(|| move_node(black_box(&tree), black_box(&[0]), black_box(&[width - 1])))
    });
    group.bench_function("root_to_deepest", |b| {
        b.iter(|| move_node(black_box(&tree), black_box(&[0]), black_box(&into_deepest)))
    });

    group.finish();
}

fn benchmark_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    let (width, depth) = (50, 8);
    let tree = build_tree(width, depth);
    let last_id = format!("root{}-r{}", "-g".repeat(depth), width - 1);

    group.bench_function("find_node_by_id_last", |b| {
        b.iter(|| {
            let found = find_node_by_id(black_box(&tree), black_box(&last_id));
            black_box(found.map(|f| f.path))
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_primitives, benchmark_move, benchmark_lookup);
criterion_main!(benches);
