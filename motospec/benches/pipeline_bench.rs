//! Benchmarks for pipeline throughput and page extraction.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;

use motospec::core::Item;
use motospec::document::Document;
use motospec::pipeline::{PipelineBuilder, PipelineHandles};
use motospec::stages::{extract_brands, SiteSelectors, Stage};
use motospec::testing::fixtures::brand_page;
use motospec::testing::{RecordingStage, StaticFetcher};

async fn pass_through(stages: usize, items: usize) -> usize {
    let chain = (0..stages)
        .map(|i| Arc::new(RecordingStage::new(format!("stage-{i}"))) as Arc<dyn Stage>);
    let (pipeline, handles) = PipelineBuilder::new(Arc::new(StaticFetcher::new()))
        .stages(chain)
        .interval(Duration::ZERO)
        .build();
    let PipelineHandles {
        input, mut output, ..
    } = handles;

    let run = tokio::spawn(pipeline.run());
    tokio::spawn(async move {
        for i in 0..items {
            if input.send(Item::Url(format!("https://bench.test/{i}"))).await.is_err() {
                break;
            }
        }
    });

    let mut received = 0;
    while output.recv().await.is_some() {
        received += 1;
    }
    let _ = run.await;
    received
}

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("pass_through");
    for stages in [1, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(stages), &stages, |b, &stages| {
            b.iter(|| runtime.block_on(pass_through(black_box(stages), 200)));
        });
    }
    group.finish();
}

fn extraction_benchmark(c: &mut Criterion) {
    let names: Vec<String> = (0..500).map(|i| format!("Brand{i}")).collect();
    let links: Vec<String> = (0..500).map(|i| format!("https://bench.test/brand/{i}/")).collect();
    let rows: Vec<(&str, Option<&str>)> = names
        .iter()
        .zip(&links)
        .map(|(name, link)| (name.as_str(), Some(link.as_str())))
        .collect();
    let page = brand_page(&rows);
    let selectors = SiteSelectors::default();

    c.bench_function("extract_brands_500", |b| {
        b.iter(|| {
            let doc = Document::parse(black_box(&page));
            extract_brands(&doc, &selectors).map(|brands| brands.len())
        });
    });
}

criterion_group!(benches, pipeline_benchmark, extraction_benchmark);
criterion_main!(benches);
