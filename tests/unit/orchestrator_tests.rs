/*!
 * Tests for translation orchestration: ordering, correspondence repair,
 * retries, failure policies, concurrency and cancellation
 */

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use doctrans::app_config::{DrainPolicy, FailurePolicy, OrchestrationConfig};
use doctrans::document::{FormatAttributes, StructuralUnit};
use doctrans::errors::TranslationError;
use doctrans::glossary::{DictionaryScope, GlossaryStore, MergedGlossary};
use doctrans::providers::mock::{MOCK_PREFIX, MockBackend, MockBehavior};
use doctrans::translation::chunking::ChunkLimit;
use doctrans::translation::{Orchestrator, TranslationStatus};

use crate::common;

fn orchestrator(backend: &MockBackend, config: OrchestrationConfig) -> Orchestrator {
    Orchestrator::new(Arc::new(backend.clone()), config)
}

fn ids(units: &[StructuralUnit]) -> Vec<String> {
    units.iter().map(|u| u.id().to_string()).collect()
}

fn translated(text: &str) -> String {
    format!("{}{}", MOCK_PREFIX, text)
}

/// Test that output length and id order match the input for every chunk size and backend
#[tokio::test]
async fn test_translateUnits_acrossChunkSizesAndBackends_shouldPreserveOrder() {
    common::init_logging();
    let units = common::text_units(&[
        "一つ目の段落", "二つ目の段落", "三つ目の段落", "四つ目の段落", "五つ目の段落",
        "六つ目の段落", "七つ目の段落",
    ]);

    for chunk_size in 1..=8 {
        let backends = [
            MockBackend::new(MockBehavior::RandomDelay { max_ms: 5 }),
            MockBackend::transient_then_success(2),
            MockBackend::new(MockBehavior::MalformedBatches),
            MockBackend::merging(),
        ];

        for backend in backends {
            let results = orchestrator(&backend, common::fast_orchestration(chunk_size))
                .translate_units(&units, &MergedGlossary::default())
                .await
                .unwrap();

            let result_ids: Vec<String> = results.iter().map(|r| r.unit_id.clone()).collect();
            assert_eq!(result_ids, ids(&units), "chunk size {} with {:?}", chunk_size, backend);
            for (unit, result) in units.iter().zip(&results) {
                assert_eq!(result.order_index, unit.order_index());
                assert_eq!(result.status, TranslationStatus::Ok);
            }
        }
    }
}

/// Test character-bounded chunking keeps the correspondence
#[tokio::test]
async fn test_translateUnits_withCharacterLimit_shouldPreserveOrder() {
    let units = common::text_units(&["短い", "とても長い段落がここにあります", "中くらいの文", "終"]);
    let backend = MockBackend::working();
    let config = OrchestrationConfig {
        chunk_limit: ChunkLimit::Characters,
        ..common::fast_orchestration(8)
    };

    let results = orchestrator(&backend, config)
        .translate_units(&units, &MergedGlossary::default())
        .await
        .unwrap();

    let texts: Vec<&str> = results.iter().map(|r| r.translated_text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            translated("短い"),
            translated("とても長い段落がここにあります"),
            translated("中くらいの文"),
            translated("終")
        ]
    );
    // The oversize unit travels alone
    assert!(backend.requests().contains(&vec!["とても長い段落がここにあります".to_string()]));
}

/// Test that temp dictionary entries win and only matching terms are sent
#[tokio::test]
async fn test_translateUnits_withMergedGlossary_shouldApplyTempTranslations() {
    let mut store = GlossaryStore::in_memory();
    store.add(DictionaryScope::Permanent, "日本語", "日语").unwrap();
    store.add(DictionaryScope::Permanent, "東京", "东京").unwrap();
    store.add(DictionaryScope::Temp, "日本語", "日文").unwrap();
    store.add(DictionaryScope::Temp, "テスト", "测试").unwrap();
    let glossary = store.merge();

    let units = common::text_units(&["日本語のテストです", "プログラム"]);
    let backend = MockBackend::working();
    let results = orchestrator(&backend, common::fast_orchestration(10))
        .translate_units(&units, &glossary)
        .await
        .unwrap();

    assert_eq!(results[0].translated_text, translated("日文の测试です"));
    assert_eq!(results[1].translated_text, translated("プログラム"));
    assert_eq!(backend.request_count(), 1);
}

/// Test that a merged batch response falls back to one request per unit
#[tokio::test]
async fn test_run_withMergingBackend_shouldRepairCorrespondence() {
    let units = common::text_units(&["日本語のテストです", "プログラム"]);
    let backend = MockBackend::merging();

    let (outcome, report) = orchestrator(&backend, common::fast_orchestration(10))
        .run(&units, &MergedGlossary::default())
        .await;
    let results = outcome.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].unit_id, "p1");
    assert_eq!(results[0].translated_text, translated("日本語のテストです"));
    assert_eq!(results[1].unit_id, "p2");
    assert_eq!(results[1].translated_text, translated("プログラム"));

    assert_eq!(report.requests.chunk_requests, 1);
    assert_eq!(report.requests.unit_requests, 2);
    assert_eq!(report.requests.mismatches, 1);
    assert_eq!(backend.request_count(), 3);
}

/// Test that a batch with a blanked unit is retried unit by unit instead of losing text
#[tokio::test]
async fn test_run_withBlankedBatchUnit_shouldFallBackPerUnit() {
    let units = common::text_units(&["日本語のテストです", "プログラム"]);
    let backend = MockBackend::new(MockBehavior::BlankingBatches);

    let (outcome, report) = orchestrator(&backend, common::fast_orchestration(10))
        .run(&units, &MergedGlossary::default())
        .await;
    let results = outcome.unwrap();

    assert_eq!(results[0].translated_text, translated("日本語のテストです"));
    assert_eq!(results[1].translated_text, translated("プログラム"));
    assert!(results.iter().all(|r| r.status == TranslationStatus::Ok));
    assert_eq!(report.requests.mismatches, 1);
    assert_eq!(report.requests.unit_requests, 2);
    assert_eq!(backend.request_count(), 3);
}

/// Test that units sharing an order index still come back in input order
#[tokio::test]
async fn test_translateUnits_withRepeatedOrderIndex_shouldKeepInputOrder() {
    let units = vec![
        StructuralUnit::placeholder("img", 0, "image1.png", FormatAttributes::default()),
        StructuralUnit::text("p1", 0, "本文です", FormatAttributes::default()),
        StructuralUnit::text("p2", 0, "続きです", FormatAttributes::default()),
    ];
    let backend = MockBackend::working();

    let results = orchestrator(&backend, common::fast_orchestration(1))
        .translate_units(&units, &MergedGlossary::default())
        .await
        .unwrap();

    let result_ids: Vec<String> = results.iter().map(|r| r.unit_id.clone()).collect();
    assert_eq!(result_ids, ids(&units));
    assert_eq!(results[0].status, TranslationStatus::Passthrough);
    assert_eq!(results[2].translated_text, translated("続きです"));
}

/// Test that units not sorted by order index are joined in the order given
#[tokio::test]
async fn test_translateUnits_withUnsortedOrderIndex_shouldKeepInputOrder() {
    let units = vec![
        StructuralUnit::text("b", 1, "二番目", FormatAttributes::default()),
        StructuralUnit::text("a", 0, "一番目", FormatAttributes::default()),
    ];
    let backend = MockBackend::working();

    let results = orchestrator(&backend, common::fast_orchestration(10))
        .translate_units(&units, &MergedGlossary::default())
        .await
        .unwrap();

    assert_eq!(results[0].unit_id, "b");
    assert_eq!(results[0].translated_text, translated("二番目"));
    assert_eq!(results[1].unit_id, "a");
}

/// Test that transient failures are retried without duplicating results
#[tokio::test]
async fn test_run_withTransientThenSuccess_shouldRetryOnce() {
    let units = common::text_units(&["最初の文", "次の文"]);
    let backend = MockBackend::transient_then_success(2);

    let (outcome, report) = orchestrator(&backend, common::fast_orchestration(10))
        .run(&units, &MergedGlossary::default())
        .await;
    let results = outcome.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.status == TranslationStatus::Ok));
    assert_eq!(report.requests.retries, 2);
    assert_eq!(report.requests.unit_requests, 0);
    assert_eq!(backend.request_count(), 3);
}

/// Test that a unit failing every attempt keeps its source text under fail-open
#[tokio::test]
async fn test_run_withFailOpen_shouldKeepOriginalText() {
    let units = common::text_units(&["森の中", "毒キノコ", "川の流れ"]);
    let backend = MockBackend::fail_on("毒");

    let (outcome, report) = orchestrator(&backend, common::fast_orchestration(10))
        .run(&units, &MergedGlossary::default())
        .await;
    let results = outcome.unwrap();

    assert_eq!(results[0].status, TranslationStatus::Ok);
    assert_eq!(results[1].status, TranslationStatus::FallbackOriginal);
    assert_eq!(results[1].translated_text, "毒キノコ");
    assert_eq!(results[2].status, TranslationStatus::Ok);

    assert!(report.is_complete());
    assert_eq!(report.fallback_ids, vec!["p2".to_string()]);
    assert_eq!(report.translated, 2);
}

/// Test that fail-closed aborts with the failing unit's id
#[tokio::test]
async fn test_translateUnits_withFailClosed_shouldAbort() {
    let units = common::text_units(&["森の中", "毒キノコ", "川の流れ"]);
    let backend = MockBackend::fail_on("毒");
    let config = OrchestrationConfig {
        failure_policy: FailurePolicy::FailClosed,
        ..common::fast_orchestration(10)
    };

    let (outcome, report) = orchestrator(&backend, config)
        .run(&units, &MergedGlossary::default())
        .await;

    match outcome {
        Err(TranslationError::UnitFailed { unit_id, .. }) => assert_eq!(unit_id, "p2"),
        other => panic!("expected UnitFailed, got {:?}", other),
    }
    assert!(!report.is_complete());
}

/// Test that a fatal backend error aborts the run
#[tokio::test]
async fn test_translateUnits_withFatalBackend_shouldAbort() {
    let units = common::text_units(&["一", "二", "三", "四", "五"]);
    let backend = MockBackend::fatal();

    let result = orchestrator(&backend, common::fast_orchestration(2))
        .translate_units(&units, &MergedGlossary::default())
        .await;

    assert!(matches!(result, Err(TranslationError::BackendFatal(_))));
    // Fatal errors are never retried
    assert!(backend.request_count() <= 3);
}

/// Test that malformed single-unit responses are retried then kept as source
#[tokio::test]
async fn test_run_withAlwaysMalformed_shouldFallBackAfterRetries() {
    let units = common::text_units(&["壊れた応答", "もう一つ"]);
    let backend = MockBackend::new(MockBehavior::AlwaysMalformed);

    let (outcome, report) = orchestrator(&backend, common::fast_orchestration(10))
        .run(&units, &MergedGlossary::default())
        .await;
    let results = outcome.unwrap();

    assert!(results.iter().all(|r| r.status == TranslationStatus::FallbackOriginal));
    // One chunk request, then four attempts per unit
    assert_eq!(backend.request_count(), 9);
    assert_eq!(report.requests.mismatches, 1);
    assert_eq!(report.fallback, 2);
}

/// Test that placeholders and blank units never reach the backend
#[tokio::test]
async fn test_translateUnits_withPlaceholders_shouldNeverSendThem() {
    let units = vec![
        StructuralUnit::text("h1", 0, "見出し", FormatAttributes::styled("Heading 1")),
        StructuralUnit::placeholder("img", 1, "[[figure-1]]", FormatAttributes::styled("Figure")),
        StructuralUnit::text("blank", 2, "   ", FormatAttributes::default()),
        StructuralUnit::text("p1", 3, "本文です", FormatAttributes::default()),
    ];
    let backend = MockBackend::working();

    let results = orchestrator(&backend, common::fast_orchestration(10))
        .translate_units(&units, &MergedGlossary::default())
        .await
        .unwrap();

    let sent = backend.sent_texts();
    assert_eq!(sent, vec!["見出し".to_string(), "本文です".to_string()]);
    assert_eq!(results.len(), 4);
    assert_eq!(results[1].status, TranslationStatus::Passthrough);
    assert_eq!(results[2].status, TranslationStatus::Passthrough);
    assert_eq!(results[3].translated_text, translated("本文です"));
}

/// Test that the number of concurrent backend calls stays within the limit
#[tokio::test]
async fn test_translateUnits_withSlowBackend_shouldBoundConcurrency() {
    let texts: Vec<String> = (1..=12).map(|i| format!("段落{}", i)).collect();
    let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let units = common::text_units(&text_refs);
    let backend = MockBackend::new(MockBehavior::Slow { delay_ms: 20 });
    let config = OrchestrationConfig {
        concurrent_requests: 3,
        ..common::fast_orchestration(1)
    };

    let results = orchestrator(&backend, config)
        .translate_units(&units, &MergedGlossary::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 12);
    assert!(backend.max_in_flight() <= 3);
    assert!(backend.max_in_flight() >= 1);
}

/// Test that identical requests share one backend call
#[tokio::test]
async fn test_run_withIdenticalUnits_shouldDeduplicateRequests() {
    let units = common::text_units(&["同じ文", "同じ文", "同じ文"]);
    let backend = MockBackend::working();

    let (outcome, report) = orchestrator(&backend, common::fast_orchestration(1))
        .run(&units, &MergedGlossary::default())
        .await;
    let results = outcome.unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.translated_text == translated("同じ文")));
    assert_eq!(backend.request_count(), 1);
    assert_eq!(report.requests.deduplicated, 2);
}

/// Test that deduplication can be turned off
#[tokio::test]
async fn test_run_withDeduplicationDisabled_shouldCallEveryTime() {
    let units = common::text_units(&["同じ文", "同じ文"]);
    let backend = MockBackend::working();
    let config = OrchestrationConfig {
        deduplicate_requests: false,
        ..common::fast_orchestration(1)
    };

    let (outcome, report) = orchestrator(&backend, config)
        .run(&units, &MergedGlossary::default())
        .await;

    assert!(outcome.is_ok());
    assert_eq!(backend.request_count(), 2);
    assert_eq!(report.requests.deduplicated, 0);
}

/// Test that a run cancelled up front returns Cancelled without calling the backend
#[tokio::test]
async fn test_translateUnits_withCancelledToken_shouldReturnCancelled() {
    let units = common::text_units(&["一", "二"]);
    let backend = MockBackend::working();
    let token = CancellationToken::new();
    token.cancel();

    let result = orchestrator(&backend, common::fast_orchestration(1))
        .with_cancellation(token)
        .translate_units(&units, &MergedGlossary::default())
        .await;

    assert_eq!(result, Err(TranslationError::Cancelled));
    assert_eq!(backend.request_count(), 0);
}

/// Test that cancelling mid-run never yields partial results under either drain policy
#[tokio::test]
async fn test_translateUnits_cancelledMidRun_shouldReturnCancelled() {
    for drain_policy in [DrainPolicy::Drain, DrainPolicy::Abandon] {
        let texts: Vec<String> = (1..=8).map(|i| format!("段落{}", i)).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let units = common::text_units(&text_refs);
        let backend = MockBackend::new(MockBehavior::Slow { delay_ms: 50 });
        let config = OrchestrationConfig {
            concurrent_requests: 2,
            drain_policy,
            ..common::fast_orchestration(1)
        };

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = orchestrator(&backend, config)
            .with_cancellation(token)
            .translate_units(&units, &MergedGlossary::default())
            .await;

        assert_eq!(result, Err(TranslationError::Cancelled), "{:?}", drain_policy);
        assert!(backend.request_count() < 8);
    }
}

/// Test that progress is reported per chunk up to the total
#[tokio::test]
async fn test_run_withProgressCallback_shouldReportEveryChunk() {
    let units = common::text_units(&["一", "二", "三", "四", "五", "六"]);
    let backend = MockBackend::working();
    let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let (outcome, _) = orchestrator(&backend, common::fast_orchestration(2))
        .with_progress(Arc::new(move |done, total| sink.lock().push((done, total))))
        .run(&units, &MergedGlossary::default())
        .await;

    assert!(outcome.is_ok());
    let seen = seen.lock();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen.last(), Some(&(6, 6)));
    assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
}

/// Test the run report for a document mixing text and placeholders
#[tokio::test]
async fn test_run_report_shouldCountStatuses() {
    let units = vec![
        StructuralUnit::text("p1", 0, "本文", FormatAttributes::default()),
        StructuralUnit::placeholder("t1", 1, "[[table-1]]", FormatAttributes::default()),
        StructuralUnit::text("p2", 2, "結論", FormatAttributes::default()),
    ];
    let backend = MockBackend::working();

    let (outcome, report) = orchestrator(&backend, common::fast_orchestration(10))
        .run(&units, &MergedGlossary::default())
        .await;

    assert!(outcome.is_ok());
    assert_eq!(report.total_units, 3);
    assert_eq!(report.translated, 2);
    assert_eq!(report.passthrough, 1);
    assert!(report.fallback_ids.is_empty());
    assert!(report.summary().contains("Translated 2 of 3 units"));
}
