/// Comprehensive test suite for save coordination
/// Tests save plans, handler lifetimes, status settling and error paths
use crate::*;

#[cfg(test)]
mod save_coordination_tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn counting(calls: Arc<AtomicUsize>) -> impl SaveHandler {
        handler_fn(move |_doc| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<(), PersistenceError>(())
            }
            .boxed()
        })
    }

    fn failing(message: &'static str) -> impl SaveHandler {
        handler_fn(move |_doc| async move { Err::<(), _>(PersistenceError::backend(message)) }.boxed())
    }

    fn controller(
        plans: SavePlans,
        registry: CallbackRegistry,
        store: Arc<MemoryStore>,
        status_display: Option<Duration>,
    ) -> EditorController {
        EditorController::new(
            SaveOrchestrator::new(plans, registry, store),
            PathMutator::default(),
            status_display,
        )
    }

    #[tokio::test]
    async fn test_cards_plan_skips_document_persist() {
        let store = Arc::new(MemoryStore::new());
        let registry = CallbackRegistry::new();
        let list_calls = Arc::new(AtomicUsize::new(0));
        let detail_calls = Arc::new(AtomicUsize::new(0));
        let _list = registry.register("cardsList", counting(list_calls.clone()));
        let _detail = registry.register("cardsDetail", counting(detail_calls.clone()));

        let c = controller(SavePlans::default(), registry, store.clone(), None);
        c.set("cards.0.title", "First").unwrap();

        let outcome = c.save("cards").await;

        assert!(matches!(outcome, SaveOutcome::Saved { version: 1 }));
        assert_eq!(list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(detail_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.persist_count(), 0);
        assert_eq!(c.status(), SaveStatus::Saved);
    }

    #[tokio::test]
    async fn test_plan_without_any_step_reports_nothing_persisted() {
        let store = Arc::new(MemoryStore::new());
        let c = controller(SavePlans::default(), CallbackRegistry::new(), store.clone(), None);
        let mut statuses = c.subscribe();
        c.set("cards.0.title", "First").unwrap();

        // cards handlers own persistence, but no panel registered them
        let outcome = c.save("cards").await;

        assert!(outcome.is_nothing_persisted(), "{outcome:?}");
        assert!(!outcome.is_saved());
        assert_eq!(store.persist_count(), 0);
        assert_eq!(c.status(), SaveStatus::Dirty);
        assert_eq!(c.unsaved_sections(), vec!["cards"]);

        let mut seen = Vec::new();
        while let Ok(event) = statuses.try_recv() {
            seen.push(event.change.to);
        }
        assert_eq!(seen, vec![SaveStatus::Dirty, SaveStatus::Saving, SaveStatus::Dirty]);
    }

    #[tokio::test]
    async fn test_unlisted_section_persists_document_only() {
        let store = Arc::new(MemoryStore::new());
        let c = controller(SavePlans::default(), CallbackRegistry::new(), store.clone(), None);

        c.set("seo.title", "Home").unwrap();
        assert!(c.save("seo").await.is_saved());

        assert_eq!(store.persist_count(), 1);
        assert_eq!(store.persisted()[0].root(), &json!({ "seo": { "title": "Home" } }));
    }

    #[tokio::test]
    async fn test_missing_handler_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let registry = CallbackRegistry::new();
        let media_calls = Arc::new(AtomicUsize::new(0));
        let _media = registry.register("contentMedia", counting(media_calls.clone()));

        let c = controller(SavePlans::default(), registry, store.clone(), None);
        c.set("content.body", "text").unwrap();

        assert!(c.save("content").await.is_saved());
        assert_eq!(media_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.persist_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_handler_stops_the_save() {
        let store = Arc::new(MemoryStore::new());
        let registry = CallbackRegistry::new();
        let media_calls = Arc::new(AtomicUsize::new(0));
        let _blocks = registry.register("contentBlocks", failing("upload rejected"));
        let _media = registry.register("contentMedia", counting(media_calls.clone()));

        let c = controller(SavePlans::default(), registry, store.clone(), None);
        c.set("content.body", "draft").unwrap();

        match c.save("content").await {
            SaveOutcome::Failed { stage, error } => {
                assert_eq!(stage, SaveStage::Callback("contentBlocks".to_string()));
                assert!(error.to_string().contains("upload rejected"));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        assert_eq!(media_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.persist_count(), 0);
        assert_eq!(c.status(), SaveStatus::Error);
        assert_eq!(c.snapshot().root()["content"]["body"], "draft");
        assert_eq!(c.unsaved_sections(), vec!["content"]);
    }

    #[tokio::test]
    async fn test_handler_sees_edits_from_earlier_handler() {
        let store = Arc::new(MemoryStore::new());
        let registry = CallbackRegistry::new();
        let plans = SavePlans::empty().with("cards", SectionPlan::new(["order", "publish"], false));
        let c = controller(plans, registry.clone(), store, None);

        let writer = c.clone();
        let _order = registry.register(
            "order",
            handler_fn(move |_doc| {
                let writer = writer.clone();
                async move {
                    writer
                        .set("cards.order", json!([2, 0, 1]))
                        .map_err(|e| PersistenceError::backend(e.to_string()))?;
                    Ok::<(), PersistenceError>(())
                }
                .boxed()
            }),
        );

        let seen: Arc<Mutex<Option<Document>>> = Arc::default();
        let seen_by_publish = seen.clone();
        let _publish = registry.register(
            "publish",
            handler_fn(move |doc| {
                *seen_by_publish.lock().unwrap() = Some(doc);
                async { Ok::<(), PersistenceError>(()) }.boxed()
            }),
        );

        c.set("cards.title", "Cards").unwrap();
        let outcome = c.save("cards").await;

        let published = seen.lock().unwrap().clone().expect("publish ran");
        assert_eq!(published.root()["cards"]["order"], json!([2, 0, 1]));
        assert_eq!(published.version, 2);

        // the edit made mid-save was covered by the publish handler
        assert!(matches!(outcome, SaveOutcome::Saved { version: 2 }));
        assert_eq!(c.status(), SaveStatus::Saved);
    }

    #[tokio::test]
    async fn test_edit_during_save_leaves_page_dirty() {
        let store = Arc::new(MemoryStore::new());
        let registry = CallbackRegistry::new();
        let plans = SavePlans::empty().with("hero", SectionPlan::new(["late"], false));
        let c = controller(plans, registry.clone(), store, None);

        // edits after its own snapshot was taken, so nothing covers them
        let writer = c.clone();
        let _late = registry.register(
            "late",
            handler_fn(move |_doc| {
                let writer = writer.clone();
                async move {
                    let _ = writer.set("hero.subtitle", "added late");
                    Ok::<(), PersistenceError>(())
                }
                .boxed()
            }),
        );

        c.set("hero.title", "Hi").unwrap();
        let outcome = c.save("hero").await;

        assert!(matches!(outcome, SaveOutcome::Saved { version: 1 }));
        assert_eq!(c.status(), SaveStatus::Dirty);
        assert_eq!(c.unsaved_sections(), vec!["hero"]);
    }

    #[tokio::test]
    async fn test_released_handler_is_not_called() {
        let store = Arc::new(MemoryStore::new());
        let registry = CallbackRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = controller(SavePlans::default(), registry.clone(), store, None);

        // panel mounts, then unmounts
        let registration = registry.register("contentBlocks", counting(calls.clone()));
        drop(registration);

        c.set("content.body", "x").unwrap();
        assert!(c.save("content").await.is_saved());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_refused_while_saving() {
        let store = Arc::new(MemoryStore::new());
        let registry = CallbackRegistry::new();
        let gate = Arc::new(tokio::sync::Notify::new());

        let waiting = gate.clone();
        let _slow = registry.register(
            "slow",
            handler_fn(move |_doc| {
                let waiting = waiting.clone();
                async move {
                    waiting.notified().await;
                    Ok::<(), PersistenceError>(())
                }
                .boxed()
            }),
        );

        let plans = SavePlans::empty().with("hero", SectionPlan::new(["slow"], true));
        let c = controller(plans, registry, store, None);
        c.set("hero.title", "Hi").unwrap();

        let (outcome, load_result) = tokio::join!(c.save("hero"), async {
            let result = c.load("about").await;
            gate.notify_one();
            result
        });

        assert!(matches!(load_result, Err(WorkspaceError::SaveInFlight)));
        assert!(outcome.is_saved());
        assert_eq!(c.snapshot().root()["hero"]["title"], "Hi");
    }

    #[tokio::test]
    async fn test_successful_save_clears_unsaved_sections() {
        let store = Arc::new(MemoryStore::new());
        let c = controller(SavePlans::empty(), CallbackRegistry::new(), store, None);

        c.set("hero.title", "Hi").unwrap();
        c.set_style("hero", "titleColor", "modeA", "#fff").unwrap();
        c.set("seo.title", "Home").unwrap();
        assert_eq!(c.unsaved_sections(), vec!["hero", "seo"]);

        assert!(c.save("hero").await.is_saved());
        assert!(c.unsaved_sections().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_and_dropped_edits_keep_status() {
        let page = json!({ "hero": "flat", "items": [] });
        let store = Arc::new(MemoryStore::new().with_page("home", page.clone()));
        let c = controller(SavePlans::empty(), CallbackRegistry::new(), store, None);
        c.load("home").await.unwrap();

        assert!(c.set("items.first", "x").is_err());
        assert!(c.set("items.5000", "x").is_err());
        assert!(c.set("hero..title", "x").is_err());
        assert_eq!(c.set_style("footer", "color", "modeA", "#000"), Ok(None));

        assert_eq!(c.status(), SaveStatus::Clean);
        assert_eq!(c.snapshot().root(), &page);
        assert!(!c.can_save());
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_status_settles_to_clean() {
        let store = Arc::new(MemoryStore::new());
        let c = controller(
            SavePlans::empty(),
            CallbackRegistry::new(),
            store,
            Some(Duration::from_millis(3000)),
        );

        c.set("hero.title", "Hi").unwrap();
        assert!(c.save("hero").await.is_saved());
        assert_eq!(c.status(), SaveStatus::Saved);

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(c.status(), SaveStatus::Saved);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(c.status(), SaveStatus::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_settles_back_to_dirty() {
        let store = Arc::new(MemoryStore::new());
        store.fail_next_persists(1);
        let c = controller(
            SavePlans::empty(),
            CallbackRegistry::new(),
            store,
            Some(Duration::from_millis(3000)),
        );

        c.set("hero.title", "Hi").unwrap();
        assert!(c.save("hero").await.is_failed());
        assert_eq!(c.status(), SaveStatus::Error);

        tokio::time::sleep(Duration::from_millis(3001)).await;
        tokio::task::yield_now().await;
        assert_eq!(c.status(), SaveStatus::Dirty);
        assert!(c.can_save());
    }

    #[tokio::test]
    async fn test_config_driven_controller_migrates_legacy_fields() {
        let config: WorkspaceConfig = serde_json::from_str(
            r#"{ "legacyFields": ["heroImage"], "legacyPreservedSlot": "light", "statusDisplayMs": 0 }"#,
        )
        .unwrap();
        let store = Arc::new(MemoryStore::new().with_page("home", json!({ "heroImage": "a.png" })));
        let c = EditorController::from_config(&config, CallbackRegistry::new(), store.clone());

        c.load("home").await.unwrap();
        c.set("heroImage.dark", "b.png").unwrap();
        assert!(c.save("home").await.is_saved());

        assert_eq!(
            store.page("home"),
            Some(json!({ "heroImage": { "light": "a.png", "dark": "b.png" } }))
        );
    }
}
