#![allow(clippy::expect_used)]

use std::fmt::Write;
use std::io;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pez::html::{load_reader, LoadOptions};
use pez::output::{print_result, PrintOptions};
use pez::xpath::EvaluationContext;
use pez::{NamespaceTable, Pipeline, Query};

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a product listing page with `rows` table rows.
fn make_listing(rows: usize) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html><head><title>Listing</title></head><body>\n<table id=\"items\">\n",
    );
    for i in 0..rows {
        let _ = writeln!(
            html,
            "  <tr class=\"{}\"><td>{i}</td><td><a href=\"/item/{i}\">Item {i}</a></td><td>{}.99</td>",
            if i % 3 == 0 { "featured" } else { "plain" },
            10 + i % 50
        );
    }
    html.push_str("</table>\n</body></html>\n");
    html
}

/// Generates sloppy markup: unclosed paragraphs and list items.
fn make_tag_soup(items: usize) -> String {
    let mut html = String::from("<body><ul>");
    for i in 0..items {
        let _ = write!(html, "<li>entry {i}<p>note <b>{i}</b>");
    }
    html
}

/// Generates markup using a declared namespace prefix.
fn make_namespaced(entries: usize) -> String {
    let mut html = String::from("<div xmlns:dc=\"http://purl.org/dc/elements/1.1/\">");
    for i in 0..entries {
        let _ = write!(html, "<dc:title>Title {i}</dc:title><span>{i}</span>");
    }
    html.push_str("</div>");
    html
}

// ---------------------------------------------------------------------------
// Loading benchmarks
// ---------------------------------------------------------------------------

fn bench_load_listing(c: &mut Criterion) {
    let html = make_listing(1000);
    c.bench_function("load_listing", |b| {
        b.iter(|| load_reader(black_box(html.as_bytes()), "bench", &LoadOptions::default()));
    });
}

fn bench_load_tag_soup(c: &mut Criterion) {
    let html = make_tag_soup(500);
    c.bench_function("load_tag_soup", |b| {
        b.iter(|| load_reader(black_box(html.as_bytes()), "bench", &LoadOptions::default()));
    });
}

// ---------------------------------------------------------------------------
// Evaluation benchmarks
// ---------------------------------------------------------------------------

fn bench_evaluate_predicate(c: &mut Criterion) {
    let html = make_listing(1000);
    let tree = load_reader(html.as_bytes(), "bench", &LoadOptions::default())
        .expect("failed to load listing");
    let ctx = EvaluationContext::new(&tree);
    c.bench_function("evaluate_predicate", |b| {
        b.iter(|| ctx.evaluate(black_box("//tr[@class='featured']/td[2]/a/@href")));
    });
}

fn bench_evaluate_namespaced(c: &mut Criterion) {
    let html = make_namespaced(500);
    let tree = load_reader(html.as_bytes(), "bench", &LoadOptions::default())
        .expect("failed to load namespaced markup");
    let table = NamespaceTable::parse("d=http://purl.org/dc/elements/1.1/")
        .expect("failed to parse namespaces");
    let ctx = EvaluationContext::new(&tree).with_namespaces(&table);
    c.bench_function("evaluate_namespaced", |b| {
        b.iter(|| ctx.evaluate(black_box("//d:title/text()")));
    });
}

// ---------------------------------------------------------------------------
// Printing benchmark
// ---------------------------------------------------------------------------

fn bench_print_rows(c: &mut Criterion) {
    let html = make_listing(1000);
    let tree = load_reader(html.as_bytes(), "bench", &LoadOptions::default())
        .expect("failed to load listing");
    let result = EvaluationContext::new(&tree)
        .evaluate("//tr")
        .expect("failed to evaluate");
    let options = PrintOptions::default();
    c.bench_function("print_rows", |b| {
        b.iter(|| print_result(black_box(&result), &mut io::sink(), &options));
    });
}

// ---------------------------------------------------------------------------
// Whole pipeline
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    let html = make_listing(1000);
    let pipeline = Pipeline::default();
    let query = Query::new("//tr[@class='featured']");
    c.bench_function("pipeline", |b| {
        b.iter(|| {
            pipeline
                .run(&query, black_box(html.as_bytes()), &mut io::sink())
                .expect("pipeline failed");
        });
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(loading, bench_load_listing, bench_load_tag_soup);

criterion_group!(evaluation, bench_evaluate_predicate, bench_evaluate_namespaced);

criterion_group!(printing, bench_print_rows);

criterion_group!(pipeline, bench_pipeline);

criterion_main!(loading, evaluation, printing, pipeline);
