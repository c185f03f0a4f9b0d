use super::*;
use crate::pipeline::submit::STARTED_MESSAGE;
use crate::types::Event;
use std::collections::HashSet;

#[tokio::test]
async fn submit_returns_pending_and_is_immediately_queryable() {
    let server = article_server().await;
    let (adapters, _) = stub_adapters();
    let (orchestrator, _temp) = create_test_orchestrator(adapters).await;

    let response = orchestrator
        .submit(request(format!("{}/article", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, Status::Pending);
    assert_eq!(response.message, STARTED_MESSAGE);
    let status = orchestrator.status(response.task_id).await.unwrap();
    assert_eq!(status.task_id, response.task_id);
    assert_eq!(status.url, format!("{}/article", server.uri()));

    wait_for_terminal(&orchestrator, response.task_id).await;
}

#[tokio::test]
async fn invalid_urls_are_rejected_without_creating_a_task() {
    let (adapters, _) = stub_adapters();
    let (orchestrator, _temp) = create_test_orchestrator(adapters).await;

    for url in ["not a url", "ftp://example.com/file", "/relative/path", ""] {
        let err = orchestrator.submit(request(url)).await.unwrap_err();
        assert!(
            matches!(err, Error::Fetch(FetchError::InvalidUrl { .. })),
            "{url:?} gave {err:?}"
        );
    }
    assert!(orchestrator.registry.is_empty().await);
}

#[tokio::test]
async fn task_ids_are_unique() {
    let server = article_server().await;
    let (adapters, _) = stub_adapters();
    let (orchestrator, _temp) = create_test_orchestrator(adapters).await;

    let mut ids = HashSet::new();
    for _ in 0..5 {
        let response = orchestrator
            .submit(request(format!("{}/article", server.uri())))
            .await
            .unwrap();
        assert!(ids.insert(response.task_id));
    }
    for id in &ids {
        wait_for_terminal(&orchestrator, *id).await;
    }
    assert_eq!(orchestrator.registry.len().await, 5);
}

#[tokio::test]
async fn request_options_are_normalized_into_task_config() {
    let server = article_server().await;
    let (adapters, _) = stub_adapters();
    let (orchestrator, _temp) = create_test_orchestrator(adapters).await;

    let mut req = request(format!("{}/article", server.uri()));
    req.user_id = Some("someone".into());
    req.word_count = Some(0);
    req.voice = Some("  en-GB-SoniaNeural ".into());
    req.chapters = Some(vec!["Intro".into(), "   ".into()]);
    req.llm = Some(crate::types::LlmOverride {
        base_url: Some(String::new()),
        model: Some("my-model".into()),
        api_key: Some("".into()),
    });

    let id = orchestrator.submit(req).await.unwrap().task_id;
    let record = orchestrator.registry.get(id).await.unwrap();

    assert_eq!(record.config.word_count, 1000);
    assert_eq!(record.config.voice.as_deref(), Some("en-GB-SoniaNeural"));
    assert_eq!(record.config.chapters, vec!["Intro".to_string()]);
    assert_eq!(record.config.llm.base_url, None);
    assert_eq!(record.config.llm.model.as_deref(), Some("my-model"));
    assert_eq!(record.config.llm.api_key, None);

    wait_for_terminal(&orchestrator, id).await;
}

#[tokio::test]
async fn lifecycle_events_are_broadcast_in_order() {
    let server = article_server().await;
    let (adapters, _) = stub_adapters();
    let (orchestrator, _temp) = create_test_orchestrator(adapters).await;
    let mut events = orchestrator.subscribe();

    let id = orchestrator
        .submit(request(format!("{}/article", server.uri())))
        .await
        .unwrap()
        .task_id;

    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(std::time::Duration::from_secs(10), events.recv())
            .await
            .unwrap()
            .unwrap();
        let done = matches!(event, Event::Completed { .. } | Event::Failed { .. });
        seen.push(event);
        if done {
            break;
        }
    }

    assert!(matches!(seen[0], Event::Queued { id: qid, .. } if qid == id));
    let stages: Vec<Stage> = seen
        .iter()
        .filter_map(|e| match e {
            Event::StageStarted { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages, vec![Stage::Fetch, Stage::Summarize, Stage::Compose]);
    assert!(matches!(seen.last(), Some(Event::Completed { id: cid, .. }) if *cid == id));
}
