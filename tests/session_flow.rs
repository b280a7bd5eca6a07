//! 会话流程集成测试
//!
//! 语言切换、恢复原文、增量翻译、过期结果与偏好恢复

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use live_translate::parsers::html::{get_node_attr, text_content};
use live_translate::translation::session::{IncrementalStep, SwitchStep};
use live_translate::translation::{
    IncrementalOutcome, LiveDocument, SwitchOutcome, TextDirection, TranslationConfig,
    TranslationError, TranslationSession, LOADING_LABEL,
};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{memory_store, session_with, test_config, MockBackend};

fn text_of(session: &TranslationSession, id: &str) -> String {
    let node = session.document().find_by_id(id).unwrap();
    text_content(&node)
}

fn attr_of(session: &TranslationSession, id: &str, attr: &str) -> Option<String> {
    let node = session.document().find_by_id(id).unwrap();
    get_node_attr(&node, attr)
}

#[tokio::test]
async fn test_switch_translates_text_and_attributes() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();

    let outcome = session.switch_language("es").await.unwrap();
    assert!(matches!(outcome, SwitchOutcome::Applied(report) if report.applied == 6));

    assert_eq!(text_of(&session, "title"), "[es] Welcome to the guide");
    assert_eq!(text_of(&session, "price"), "$ 19.99");
    assert_eq!(
        attr_of(&session, "search", "placeholder").as_deref(),
        Some("[es] Search the docs")
    );
    assert_eq!(
        attr_of(&session, "save", "title").as_deref(),
        Some("[es] Save changes")
    );

    let html = session.document().to_html().unwrap();
    assert!(html.contains("Brand Name"));
    assert!(html.contains("<pre>cargo build --release</pre>"));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_baseline_restores_exact_originals_after_cycles() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();

    let body = session.document().body().unwrap();
    let original_text = text_content(&body);
    let original_placeholder = attr_of(&session, "search", "placeholder");

    for lang in ["es", "ar", "de", "en", "ja", "en"] {
        session.switch_language(lang).await.unwrap();
    }

    assert_eq!(text_content(&body), original_text);
    assert_eq!(attr_of(&session, "search", "placeholder"), original_placeholder);
    assert_eq!(session.document().direction(), TextDirection::Ltr);
}

#[tokio::test]
async fn test_baseline_switch_never_calls_backend() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();

    session.switch_language("fr").await.unwrap();
    let calls = backend.calls();

    let outcome = session.switch_language("en").await.unwrap();
    assert!(matches!(outcome, SwitchOutcome::Restored(_)));
    assert_eq!(backend.calls(), calls);
}

#[tokio::test]
async fn test_direction_follows_arabic() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();

    session.switch_language("ar").await.unwrap();
    assert_eq!(session.document().direction(), TextDirection::Rtl);

    session.switch_language("hi").await.unwrap();
    assert_eq!(session.document().direction(), TextDirection::Ltr);

    session.switch_language("ar").await.unwrap();
    session.switch_language("en").await.unwrap();
    assert_eq!(session.document().direction(), TextDirection::Ltr);
}

#[tokio::test]
async fn test_reselecting_and_unknown_languages() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();

    session.switch_language("ru").await.unwrap();
    let calls = backend.calls();
    let generation = session.state().generation;

    assert_eq!(
        session.switch_language("ru").await.unwrap(),
        SwitchOutcome::Unchanged
    );
    assert_eq!(backend.calls(), calls);
    assert_eq!(session.state().generation, generation);

    assert!(matches!(
        session.switch_language("klingon").await,
        Err(TranslationError::UnsupportedLanguage(_))
    ));
    assert_eq!(session.current_lang(), "ru");
}

#[tokio::test]
async fn test_loading_label_during_switch() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();

    let SwitchStep::Pending(pending) = session.begin_switch("es").unwrap() else {
        panic!("expected a pending switch");
    };
    assert_eq!(session.label(), LOADING_LABEL);
    assert!(session.state().loading);

    let translations = session
        .client()
        .clone()
        .translate(&pending.job.texts, "es")
        .await;
    session.complete_switch(pending, &translations);

    assert_eq!(session.label(), "\u{1F1EA}\u{1F1F8}  Espa\u{f1}ol");
    assert!(!session.state().loading);
}

#[tokio::test]
async fn test_incremental_discovery_translates_only_new_content() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();
    session.switch_language("es").await.unwrap();
    let calls = backend.calls();

    let body = session.document().body().unwrap();
    session
        .document_mut()
        .append_html(&body, "<p id=\"fresh\">Fresh paragraph</p>")
        .unwrap();

    let start = Instant::now();
    assert_eq!(session.pump(start).await, IncrementalOutcome::Waiting);
    assert_eq!(
        session.pump(start + Duration::from_millis(299)).await,
        IncrementalOutcome::Waiting
    );

    let outcome = session.pump(start + Duration::from_millis(300)).await;
    assert!(matches!(outcome, IncrementalOutcome::Applied(report) if report.applied == 1));

    assert_eq!(text_of(&session, "fresh"), "[es] Fresh paragraph");
    assert_eq!(text_of(&session, "title"), "[es] Welcome to the guide");

    assert_eq!(backend.calls(), calls + 1);
    let last = backend.requests().pop().unwrap();
    assert_eq!(last.texts, vec!["Fresh paragraph".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_settle_waits_out_debounce() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();
    session.switch_language("de").await.unwrap();

    let body = session.document().body().unwrap();
    session
        .document_mut()
        .append_html(&body, "<div id=\"late\"><span title=\"More info\">Loaded later</span></div>")
        .unwrap();

    let before = Instant::now();
    let outcome = session.settle().await;
    assert!(Instant::now() - before >= Duration::from_millis(300));
    assert!(matches!(outcome, IncrementalOutcome::Applied(report) if report.applied == 2));
    assert_eq!(text_of(&session, "late"), "[de] Loaded later");

    // 没有新的变更时不会再触发
    assert_eq!(session.settle().await, IncrementalOutcome::Waiting);
}

#[tokio::test]
async fn test_new_content_under_baseline_is_only_registered() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();
    let registered = session.registry().len();

    let body = session.document().body().unwrap();
    session
        .document_mut()
        .append_html(&body, "<p id=\"added\">Added at baseline</p>")
        .unwrap();

    let start = Instant::now();
    session.observe_mutations(start);
    let outcome = session.pump(start + Duration::from_millis(300)).await;
    assert_eq!(outcome, IncrementalOutcome::Baseline { discovered: 1 });
    assert_eq!(session.registry().len(), registered + 1);
    assert_eq!(backend.calls(), 0);

    // 之后切换语言时它也会被翻译
    session.switch_language("es").await.unwrap();
    assert_eq!(text_of(&session, "added"), "[es] Added at baseline");
}

#[tokio::test]
async fn test_content_in_excluded_region_is_ignored() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();
    session.switch_language("es").await.unwrap();

    let body = session.document().body().unwrap();
    session
        .document_mut()
        .append_html(&body, "<div data-no-translate><p id=\"brand\">Product Name</p></div>")
        .unwrap();

    let start = Instant::now();
    session.observe_mutations(start);
    let outcome = session.pump(start + Duration::from_millis(300)).await;
    assert_eq!(outcome, IncrementalOutcome::NothingNew);
    assert_eq!(text_of(&session, "brand"), "Product Name");
}

#[tokio::test]
async fn test_page_level_opt_out_on_html_element() {
    for html in [
        "<html data-no-translate><body><p id=\"p\">Hello world</p></body></html>",
        "<html translate=\"no\"><body><p id=\"p\">Hello world</p></body></html>",
    ] {
        let backend = Arc::new(MockBackend::new());
        let document = LiveDocument::parse(html).unwrap();
        let mut session =
            TranslationSession::new(test_config(), document, backend.clone(), memory_store());
        session.start().await.unwrap();

        let outcome = session.switch_language("es").await.unwrap();
        assert!(matches!(outcome, SwitchOutcome::Applied(report) if report.applied == 0));
        assert_eq!(text_of(&session, "p"), "Hello world");
        assert_eq!(backend.calls(), 0);
        assert!(session.registry().is_empty());
    }
}

#[tokio::test]
async fn test_stale_switch_result_is_discarded() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();

    let SwitchStep::Pending(slow) = session.begin_switch("es").unwrap() else {
        panic!("expected a pending switch");
    };
    let SwitchStep::Pending(fast) = session.begin_switch("de").unwrap() else {
        panic!("expected a pending switch");
    };

    let client = session.client().clone();
    let slow_result = client.translate(&slow.job.texts, "es").await;
    let fast_result = client.translate(&fast.job.texts, "de").await;

    assert!(matches!(
        session.complete_switch(fast, &fast_result),
        SwitchOutcome::Applied(_)
    ));
    assert_eq!(session.complete_switch(slow, &slow_result), SwitchOutcome::Stale);

    assert_eq!(text_of(&session, "title"), "[de] Welcome to the guide");
    assert_eq!(session.current_lang(), "de");
}

#[tokio::test]
async fn test_last_write_wins_when_stale_results_are_kept() {
    let backend = Arc::new(MockBackend::new());
    let config = TranslationConfig {
        discard_stale_results: false,
        ..test_config()
    };
    let mut session = session_with(Arc::clone(&backend), config, memory_store());
    session.start().await.unwrap();

    let SwitchStep::Pending(slow) = session.begin_switch("es").unwrap() else {
        panic!("expected a pending switch");
    };
    let SwitchStep::Pending(fast) = session.begin_switch("de").unwrap() else {
        panic!("expected a pending switch");
    };

    let client = session.client().clone();
    let slow_result = client.translate(&slow.job.texts, "es").await;
    let fast_result = client.translate(&fast.job.texts, "de").await;

    session.complete_switch(fast, &fast_result);
    assert!(matches!(
        session.complete_switch(slow, &slow_result),
        SwitchOutcome::Applied(_)
    ));
    assert_eq!(text_of(&session, "title"), "[es] Welcome to the guide");
}

#[tokio::test]
async fn test_stale_incremental_result_is_discarded() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();
    session.switch_language("es").await.unwrap();

    let body = session.document().body().unwrap();
    session
        .document_mut()
        .append_html(&body, "<p id=\"fresh\">Fresh paragraph</p>")
        .unwrap();

    let start = Instant::now();
    session.observe_mutations(start);
    let IncrementalStep::Pending(pending) =
        session.begin_incremental(start + Duration::from_millis(300))
    else {
        panic!("expected pending incremental work");
    };

    session.switch_language("de").await.unwrap();
    let client = session.client().clone();
    let translations = client.translate(&pending.job.texts, "es").await;

    assert_eq!(
        session.complete_incremental(pending, &translations),
        IncrementalOutcome::Stale
    );
    assert_eq!(text_of(&session, "fresh"), "[de] Fresh paragraph");
}

#[tokio::test]
async fn test_removed_nodes_are_skipped_and_released() {
    let backend = Arc::new(MockBackend::new());
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();
    session.switch_language("es").await.unwrap();
    let registered = session.registry().len();

    let intro = session.document().find_by_id("intro").unwrap();
    assert!(session.document_mut().remove_node(&intro));
    drop(intro);

    let outcome = session.switch_language("fr").await.unwrap();
    assert!(matches!(outcome, SwitchOutcome::Applied(report) if report.skipped == 0));
    assert_eq!(session.registry().len(), registered - 1);
    assert_eq!(text_of(&session, "title"), "[fr] Welcome to the guide");
}

#[tokio::test]
async fn test_preference_is_restored_on_start() {
    let backend = Arc::new(MockBackend::new());
    let store = memory_store();

    let mut first = session_with(Arc::clone(&backend), test_config(), Arc::clone(&store));
    first.start().await.unwrap();
    first.switch_language("ja").await.unwrap();

    let mut second = session_with(Arc::clone(&backend), test_config(), Arc::clone(&store));
    let outcome = second.start().await.unwrap();

    assert!(matches!(outcome, SwitchOutcome::Applied(_)));
    assert_eq!(second.current_lang(), "ja");
    assert_eq!(text_of(&second, "title"), "[ja] Welcome to the guide");
    assert_eq!(second.label(), "\u{1F1EF}\u{1F1F5}  \u{65e5}\u{672c}\u{8a9e}");
}

#[tokio::test]
async fn test_translation_failure_leaves_source_text() {
    let backend = Arc::new(MockBackend::new().failing_on("Read this first"));
    let mut session = session_with(Arc::clone(&backend), test_config(), memory_store());
    session.start().await.unwrap();

    let outcome = session.switch_language("es").await.unwrap();
    assert!(matches!(outcome, SwitchOutcome::Applied(_)));
    assert_eq!(text_of(&session, "intro"), "Read this first");
    assert_eq!(text_of(&session, "title"), "Welcome to the guide");
    assert!(!session.state().loading);
}
