//! Components working together: a debounced form field autosaved into a
//! shared store and observed from a second context.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tether::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Draft {
    title: String,
    body: String,
}

fn draft_form() -> Form {
    Form::new(
        FormSchema::new()
            .field("title", FieldSpec::new().rules(FieldRules::new().required().max_length(20)))
            .field("body", FieldSpec::new()),
    )
}

#[tokio::test(start_paused = true)]
async fn debounced_autosave_reaches_other_context() {
    let hub = StorageHub::in_memory();
    let editor_tab = hub.context();
    let preview_tab = hub.context();

    let saved = StorageSync::<Draft>::new("draft", Arc::new(editor_tab), StorageSyncOptions::new());
    let preview = StorageSync::<Draft>::new("draft", Arc::new(preview_tab), StorageSyncOptions::new());

    let form = draft_form();
    let title_cell = form.field_cell("title").unwrap();
    let debounced = Debounced::new(&title_cell, Duration::from_millis(300)).unwrap();

    let autosave = {
        let saved_cell = saved.cell();
        let body_cell = form.field_cell("body").unwrap();
        debounced.output().subscribe(move |title, _| {
            saved_cell.set(Some(Draft {
                title: title.value.as_str().unwrap_or_default().to_string(),
                body: body_cell.get().value.as_str().unwrap_or_default().to_string(),
            }));
        })
    };

    form.set_field_value("body", "hello").unwrap();
    for title in ["D", "Dr", "Draft"] {
        form.set_field_value("title", title).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(preview.value(), None);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        preview.value(),
        Some(Draft {
            title: "Draft".to_string(),
            body: "hello".to_string(),
        })
    );
    assert_eq!(hub.write_count(), 1);
    drop(autosave);
}

#[tokio::test(start_paused = true)]
async fn throttled_counter_persists_to_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tether").join("store.json");
    let config = TetherConfig {
        storage: StorageConfig {
            path: Some(path.clone()),
            quota_bytes: Some(1024),
        },
        ..TetherConfig::default()
    };

    let hub = StorageHub::from_config(&config.storage).unwrap();
    let clicks = StorageSync::new("clicks", Arc::new(hub.context()), StorageSyncOptions::new().default_value(0i64));

    let counter = Counter::new(CounterOptions {
        max: 10,
        ..CounterOptions::default()
    });
    let throttled = Throttled::new(counter.cell(), config.scheduler.throttle_delay()).unwrap();
    let _persist = {
        let cell = clicks.cell();
        throttled.output().subscribe(move |n, _| {
            cell.set(Some(*n));
        })
    };

    for _ in 0..15 {
        counter.increment();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(counter.get(), 10);
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(clicks.value(), Some(10));
    let on_disk = std::fs::read_to_string(&path).unwrap();
    let entries: std::collections::BTreeMap<String, String> = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(entries.get("clicks").map(String::as_str), Some("10"));
}

#[tokio::test(start_paused = true)]
async fn form_submit_posts_through_client() {
    struct Echo {
        bodies: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl HttpTransport for Echo {
        async fn send(
            &self,
            request: tether::request::HttpRequest,
        ) -> Result<tether::request::HttpResponse, tether::request::TransportError> {
            let body = request.body.unwrap_or_default();
            self.bodies.lock().push(body.clone());
            Ok(tether::request::HttpResponse::new(201, body))
        }
    }

    let transport = Arc::new(Echo {
        bodies: Mutex::new(Vec::new()),
    });
    let api = Arc::new(ApiClient::with_transport(ApiConfig::default(), transport.clone()));

    let form = draft_form();
    form.set_field_value("title", "Release notes").unwrap();

    let outcome = {
        let api = Arc::clone(&api);
        form.submit_form(|values| async move {
            let draft: Draft = api.post("/drafts", &values).await.into_result()?;
            anyhow::ensure!(draft.title == "Release notes", "server mangled the title");
            Ok::<(), anyhow::Error>(())
        })
        .await
    };

    assert_eq!(outcome, SubmitOutcome::Submitted);
    assert_eq!(transport.bodies.lock().len(), 1);
    assert!(!api.is_loading());
}
