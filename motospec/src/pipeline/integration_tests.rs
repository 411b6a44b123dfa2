//! End-to-end tests for pipeline execution.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use crate::cancellation::Done;
use crate::core::{BrandUrl, ExitReason, Item, MotoUrl};
use crate::errors::{ErrorKind, ScrapeError};
use crate::fetch::RetryPolicy;
use crate::pipeline::{PipelineBuilder, PipelineHandles, PipelineReport};
use crate::sink::{CollectingErrorLog, ErrorSink};
use crate::stages::{default_chain, BrandStage, ModelStage, SiteSelectors, SpecStage};
use crate::testing::fixtures::{self, VariantBlock};
use crate::testing::{assert_all_closed, assert_exit_reasons, collect_output, RecordingStage, StaticFetcher};

const TIMEOUT: Duration = Duration::from_secs(5);

fn builder(fetcher: StaticFetcher) -> PipelineBuilder {
    PipelineBuilder::new(Arc::new(fetcher)).retry(RetryPolicy::no_retry())
}

/// Runs the pipeline, feeding `inputs` then closing the input, and returns
/// everything that came out.
async fn run_with(builder: PipelineBuilder, inputs: Vec<Item>) -> (Vec<Item>, PipelineReport, Done) {
    let (pipeline, handles) = builder.build();
    let PipelineHandles {
        input, output, done, ..
    } = handles;
    let run = tokio::spawn(pipeline.run());

    // Dropping `input` when the loop ends closes the chain's input.
    let feeder = tokio::spawn(async move {
        for item in inputs {
            if input.send(item).await.is_err() {
                break;
            }
        }
    });

    let items = tokio::time::timeout(TIMEOUT, collect_output(output))
        .await
        .expect("output should close");
    feeder.await.unwrap();
    let report = tokio::time::timeout(TIMEOUT, run)
        .await
        .expect("pipeline should finish")
        .unwrap();
    (items, report, done)
}

fn urls(items: &[Item]) -> Vec<String> {
    items.iter().map(|i| i.url().unwrap_or_default().to_string()).collect()
}

#[tokio::test]
async fn test_natural_completion_preserves_order() {
    let b = builder(StaticFetcher::new())
        .stage(Arc::new(RecordingStage::new("a")))
        .stage(Arc::new(RecordingStage::new("b")))
        .stage(Arc::new(RecordingStage::new("c")));
    let inputs: Vec<Item> = (0..5).map(|i| Item::Url(format!("/{i}"))).collect();

    let (items, report, done) = run_with(b, inputs.clone()).await;

    assert_eq!(items, inputs);
    assert_all_closed(&report, 3);
    assert!(report.completed_naturally());
    assert_eq!(report.delivered(), 5);
    assert!(done.is_done());
    assert_eq!(report.errors.total(), 0);
}

#[tokio::test]
async fn test_emission_order_within_one_input() {
    let b = builder(StaticFetcher::new())
        .stage(Arc::new(RecordingStage::new("fan").with_fan_out(4)))
        .stage(Arc::new(RecordingStage::new("pass")));

    let (items, _, _) = run_with(b, vec![Item::from("/a"), Item::from("/b")]).await;

    assert_eq!(
        urls(&items),
        vec!["/a/0", "/a/1", "/a/2", "/a/3", "/b/0", "/b/1", "/b/2", "/b/3"]
    );
}

#[tokio::test]
async fn test_count_property_across_stages() {
    let second = Arc::new(RecordingStage::new("filter").failing_on("/1"));
    let b = builder(StaticFetcher::new())
        .stage(Arc::new(RecordingStage::new("fan").with_fan_out(3)))
        .stage(second.clone());

    let (items, report, _) = run_with(b, vec![Item::from("/a"), Item::from("/b")]).await;

    let first = &report.workers[0];
    let filter = &report.workers[1];
    assert_eq!(first.emitted, 6);
    assert_eq!(filter.processed, first.emitted);
    assert_eq!(second.seen_count(), 6);
    assert_eq!(filter.emitted, first.emitted - filter.errors);
    assert_eq!(items.len(), 4);
    assert_eq!(report.errors.get(ErrorKind::Processing), 2);
}

#[tokio::test]
async fn test_cancellation_mid_run_shuts_everything_down() {
    let b = builder(StaticFetcher::new())
        .stage(Arc::new(RecordingStage::new("a")))
        .stage(Arc::new(RecordingStage::new("slow").with_delay(Duration::from_millis(50))))
        .stage(Arc::new(RecordingStage::new("c")));
    let (pipeline, handles) = b.build();
    let PipelineHandles {
        input,
        output,
        mut done,
        cancel,
    } = handles;

    let run = tokio::spawn(pipeline.run());
    let feeder = tokio::spawn(async move {
        let mut sent = 0;
        for i in 0..1000 {
            if input.send(Item::Url(format!("/{i}"))).await.is_err() {
                break;
            }
            sent += 1;
        }
        sent
    });
    let drain = tokio::spawn(collect_output(output));

    tokio::time::sleep(Duration::from_millis(120)).await;
    cancel.cancel("test");

    let report = tokio::time::timeout(TIMEOUT, run)
        .await
        .expect("cancelled pipeline should finish")
        .unwrap();
    tokio::time::timeout(TIMEOUT, done.wait()).await.expect("done should fire");

    assert!(report.cancelled);
    assert_all_closed(&report, 3);
    assert!(report.workers[0].exit != ExitReason::InputExhausted);
    assert!(report.delivered() < 1000);

    let delivered = tokio::time::timeout(TIMEOUT, drain).await.unwrap().unwrap();
    assert_eq!(delivered.len(), report.delivered());
    // The feeder is released rather than left blocked.
    let sent = tokio::time::timeout(TIMEOUT, feeder).await.unwrap().unwrap();
    assert!(sent < 1000);
}

#[tokio::test]
async fn test_cancel_during_slow_fetch_reports_no_errors() {
    let fetcher = StaticFetcher::new()
        .with_page("/", fixtures::brand_page(&[("Honda", Some("/honda"))]))
        .with_delay(Duration::from_secs(30));
    let client = Arc::new(CollectingErrorLog::new());
    let processor = Arc::new(CollectingErrorLog::new());
    let (pipeline, handles) = builder(fetcher)
        .stages(default_chain(&SiteSelectors::default()))
        .error_sink(ErrorSink::new_split(client.clone(), processor.clone()))
        .build();
    let PipelineHandles {
        input,
        output,
        mut done,
        cancel,
    } = handles;

    let run = tokio::spawn(pipeline.run());
    input.send(Item::from("/")).await.unwrap();
    let drain = tokio::spawn(collect_output(output));

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel("interrupted");

    let report = tokio::time::timeout(TIMEOUT, run)
        .await
        .expect("cancelled pipeline should finish")
        .unwrap();
    tokio::time::timeout(TIMEOUT, done.wait()).await.expect("done should fire");

    assert_exit_reasons(&report, &[ExitReason::Cancelled; 4]);
    assert_eq!(report.errors.total(), 0);
    assert!(client.is_empty());
    assert!(processor.is_empty());
    assert!(tokio::time::timeout(TIMEOUT, drain).await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn test_dropped_output_stops_the_chain_without_cancel() {
    let (pipeline, handles) = builder(StaticFetcher::new())
        .stage(Arc::new(RecordingStage::new("a")))
        .stage(Arc::new(RecordingStage::new("b")))
        .build();
    let PipelineHandles {
        input,
        output,
        mut done,
        cancel,
    } = handles;
    drop(output);

    let run = tokio::spawn(pipeline.run());
    let feeder = tokio::spawn(async move {
        let mut sent = 0;
        for i in 0..100 {
            if input.send(Item::Url(format!("/{i}"))).await.is_err() {
                break;
            }
            sent += 1;
        }
        sent
    });

    let sent = tokio::time::timeout(TIMEOUT, feeder)
        .await
        .expect("feeder should be released")
        .unwrap();
    let report = tokio::time::timeout(TIMEOUT, run)
        .await
        .expect("pipeline should finish")
        .unwrap();
    tokio::time::timeout(TIMEOUT, done.wait()).await.expect("done should fire");

    assert!(sent < 100);
    assert!(!cancel.is_cancelled());
    assert!(!report.cancelled);
    assert_exit_reasons(&report, &[ExitReason::DownstreamClosed, ExitReason::DownstreamClosed]);
    assert_eq!(report.delivered(), 0);
    assert_eq!(report.errors.total(), 0);
}

#[tokio::test]
async fn test_cancel_before_run() {
    let (pipeline, handles) = builder(StaticFetcher::new())
        .stage(Arc::new(RecordingStage::new("a")))
        .stage(Arc::new(RecordingStage::new("b")))
        .build();
    handles.cancel.cancel("early");

    let report = tokio::time::timeout(TIMEOUT, pipeline.run()).await.unwrap();
    assert_exit_reasons(&report, &[ExitReason::Cancelled, ExitReason::Cancelled]);
    assert!(handles.done.is_done());
    assert!(handles.input.send(Item::from("/late")).await.is_err());
}

#[tokio::test]
async fn test_brand_scenario_emits_in_document_order() {
    let fetcher = StaticFetcher::new().with_page(
        "https://www.autoevolution.com/moto/",
        fixtures::brand_page(&[("Honda", Some("/honda")), ("Yamaha", Some("/yamaha"))]),
    );
    let selectors = Arc::new(SiteSelectors::default());
    let b = builder(fetcher).stage(Arc::new(BrandStage::new(selectors)));

    let (items, report, _) = run_with(b, vec![Item::from("https://www.autoevolution.com/moto/")]).await;

    assert_eq!(
        items,
        vec![
            Item::Brand(BrandUrl { brand: "Honda".into(), url: "/honda".into() }),
            Item::Brand(BrandUrl { brand: "Yamaha".into(), url: "/yamaha".into() }),
        ]
    );
    assert_eq!(report.errors.total(), 0);
}

#[tokio::test]
async fn test_missing_href_is_one_error_and_processing_continues() {
    let fetcher = StaticFetcher::new().with_page(
        "/",
        fixtures::brand_page(&[("Honda", None), ("Yamaha", Some("/yamaha"))]),
    );
    let log = Arc::new(CollectingErrorLog::new());
    let b = builder(fetcher)
        .stage(Arc::new(BrandStage::new(Arc::new(SiteSelectors::default()))))
        .error_sink(ErrorSink::single(log.clone()));

    let (items, report, _) = run_with(b, vec![Item::from("/")]).await;

    assert_eq!(urls(&items), vec!["/yamaha"]);
    assert_eq!(report.errors.total(), 1);
    assert_eq!(
        log.of_kind(ErrorKind::Processing),
        vec![ScrapeError::processing("brand", "Honda has no link")]
    );
}

#[tokio::test]
async fn test_mismatched_spec_table_yields_one_error_and_no_spec() {
    let fetcher = StaticFetcher::new().with_page(
        "/yamaha/mt09/2022",
        fixtures::spec_page(&["A", "B", "C", "D", "E"], &["1", "2", "3", "4"]),
    );
    let log = Arc::new(CollectingErrorLog::new());
    let b = builder(fetcher)
        .stage(Arc::new(SpecStage::new(Arc::new(SiteSelectors::default()))))
        .error_sink(ErrorSink::single(log.clone()));
    let moto = MotoUrl {
        brand: "Yamaha".into(),
        model: "MT-09".into(),
        moto: "MT-09 SP".into(),
        year: "2022".into(),
        url: "/yamaha/mt09/2022".into(),
    };

    let (items, report, _) = run_with(b, vec![Item::Moto(moto)]).await;

    assert!(items.is_empty());
    let errors = log.records();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, ErrorKind::Processing);
    assert!(errors[0].1.to_string().contains("counts not equal"));
    assert_eq!(report.workers[0].emitted, 0);
}

#[tokio::test]
async fn test_wrong_item_shape_is_reported_not_fatal() {
    let fetcher = StaticFetcher::new().with_page("/honda", fixtures::model_page(&[(Some("CBR"), Some("/honda/cbr"))]));
    let log = Arc::new(CollectingErrorLog::new());
    let b = builder(fetcher)
        .stage(Arc::new(ModelStage::new(Arc::new(SiteSelectors::default()))))
        .error_sink(ErrorSink::single(log.clone()));
    let inputs = vec![
        Item::from("/not-a-brand"),
        Item::Brand(BrandUrl { brand: "Honda".into(), url: "/honda".into() }),
    ];

    let (items, _, _) = run_with(b, inputs).await;

    assert_eq!(urls(&items), vec!["/honda/cbr"]);
    assert_eq!(log.len(), 1);
    assert!(log.records()[0].1.to_string().contains("is not a valid brand"));
}

#[tokio::test]
async fn test_fetch_failures_route_to_client_log() {
    let fetcher = StaticFetcher::new()
        .with_page("/", fixtures::brand_page(&[("Honda", Some("/honda")), ("Yamaha", Some("/yamaha"))]))
        .with_error("/honda", ScrapeError::timeout("/honda"));
    let client = Arc::new(CollectingErrorLog::new());
    let processor = Arc::new(CollectingErrorLog::new());
    let b = builder(fetcher)
        .stages(default_chain(&SiteSelectors::default()).into_iter().take(2))
        .error_sink(ErrorSink::new_split(client.clone(), processor.clone()));

    let (items, report, _) = run_with(b, vec![Item::from("/")]).await;

    // "/honda" times out, "/yamaha" is unknown and answers 404.
    assert!(items.is_empty());
    assert_eq!(client.len(), 2);
    assert!(processor.is_empty());
    assert_eq!(report.errors.get(ErrorKind::Timeout), 1);
    assert_eq!(report.errors.get(ErrorKind::Other), 1);
}

#[tokio::test]
async fn test_full_chain_over_a_small_site() {
    let fetcher = StaticFetcher::new()
        .with_page("/", fixtures::brand_page(&[("Honda", Some("/honda")), ("Yamaha", Some("/yamaha"))]))
        .with_page("/honda", fixtures::model_page(&[(Some("CBR1000RR"), Some("/honda/cbr"))]))
        .with_page(
            "/yamaha",
            fixtures::model_page(&[(Some("YZF-R1"), Some("/yamaha/r1")), (Some("MT-09"), Some("/yamaha/mt09"))]),
        )
        .with_page(
            "/honda/cbr",
            fixtures::variant_page(&[VariantBlock::new("Fireblade", "2020 - 2024", "/honda/cbr/2020")]),
        )
        .with_page(
            "/yamaha/r1",
            fixtures::variant_page(&[VariantBlock::new("R1M", "2021", "/yamaha/r1/2021")]),
        )
        .with_page(
            "/yamaha/mt09",
            fixtures::variant_page(&[VariantBlock::new("MT-09 SP", "2022", "/yamaha/mt09/2022")]),
        )
        .with_page("/honda/cbr/2020", fixtures::spec_page(&["Displacement", "Power"], &["999 cc", "215 HP"]))
        .with_page("/yamaha/r1/2021", fixtures::spec_page(&["Displacement"], &["998 cc"]))
        .with_page(
            "/yamaha/mt09/2022",
            fixtures::spec_page(&["A", "B", "C", "D", "E"], &["1", "2", "3", "4"]),
        );
    let chain = default_chain(&SiteSelectors::default());
    assert_eq!(
        chain.iter().map(|s| s.name()).collect::<Vec<_>>(),
        vec!["brand", "model", "variant", "spec"]
    );
    let b = builder(fetcher).stages(chain).interval(Duration::from_millis(1));

    let (items, report, done) = run_with(b, vec![Item::from("/")]).await;

    let specs: Vec<_> = items.into_iter().filter_map(Item::into_spec).collect();
    assert_eq!(specs.len(), 2);
    assert_eq!((specs[0].brand.as_str(), specs[0].moto.as_str()), ("Honda", "Fireblade"));
    assert_eq!(specs[0].specs.get("Power").map(String::as_str), Some("215 HP"));
    assert_eq!((specs[1].brand.as_str(), specs[1].model.as_str()), ("Yamaha", "YZF-R1"));

    let emitted: Vec<_> = report.workers.iter().map(|w| w.emitted).collect();
    assert_eq!(emitted, vec![2, 3, 3, 2]);
    assert_eq!(report.errors.get(ErrorKind::Processing), 1);
    assert!(report.completed_naturally());
    assert!(done.is_done());
}
