//! Session controller runs against a scripted page.

mod common;

use std::sync::Arc;

use common::{Item, ScriptedPage, position};
use fenharvest_config::HarvestConfig;
use fenharvest_core::{
    CancellationToken, HarvestError, SessionContext, SessionController, StopReason,
};
use fenharvest_store::{RecordStore, Row};
use tempfile::TempDir;

fn harvest_config(dir: &TempDir, target: usize) -> HarvestConfig {
    let mut config = HarvestConfig::default();
    config.target_count = target;
    config.output = dir.path().join("positions.csv").display().to_string();
    config
}

fn controller(
    page: &Arc<ScriptedPage>,
    ctx: &Arc<SessionContext>,
    config: &HarvestConfig,
    cancel: CancellationToken,
) -> SessionController {
    let store = RecordStore::new(&config.output);
    SessionController::new(page.clone(), ctx.clone(), store, config, cancel)
}

async fn rows(config: &HarvestConfig) -> Vec<Row> {
    RecordStore::load(std::path::Path::new(&config.output))
        .await
        .unwrap()
}

fn payloads(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|r| r.payload.clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_target_count_stops_after_exactly_that_many_records() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(&dir, 3);
    let ctx = Arc::new(SessionContext::new());
    let items = vec![
        Item::not_ready(),
        Item::silent(),
        Item::silent(),
        Item::network(&position(1)),
        Item::network(&position(2)),
        Item::network(&position(3)),
        Item::network(&position(4)),
    ];
    let page = Arc::new(ScriptedPage::with_network(items, ctx.clone()));

    let summary = controller(&page, &ctx, &config, CancellationToken::new())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.stop, StopReason::TargetReached);
    assert_eq!(summary.confirmed, 3);
    assert_eq!(summary.failed_iterations, 3);

    let rows = rows(&config).await;
    assert_eq!(payloads(&rows), vec![position(1), position(2), position(3)]);
    let indices: Vec<u64> = rows.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    // The fourth item was reached but never recorded.
    assert_eq!(page.current(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_network_candidate_beats_probe() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(&dir, 2);
    let ctx = Arc::new(SessionContext::new());
    let items = vec![
        Item::both(&position(1), &position(99)),
        Item::network(&position(2)),
    ];
    let page = Arc::new(ScriptedPage::with_network(items, ctx.clone()));

    controller(&page, &ctx, &config, CancellationToken::new())
        .run()
        .await
        .unwrap();

    assert_eq!(payloads(&rows(&config).await), vec![position(1), position(2)]);
    assert_eq!(page.probe_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_probe_fills_in_when_network_is_silent() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(&dir, 2);
    let ctx = Arc::new(SessionContext::new());
    let items = vec![Item::probe(&position(1)), Item::network(&position(2))];
    let page = Arc::new(ScriptedPage::with_network(items, ctx.clone()));

    controller(&page, &ctx, &config, CancellationToken::new())
        .run()
        .await
        .unwrap();

    assert_eq!(payloads(&rows(&config).await), vec![position(1), position(2)]);
    assert!(page.probe_calls() >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_redelivered_payload_is_not_recorded_twice() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(&dir, 2);
    let ctx = Arc::new(SessionContext::new());
    let items = vec![
        Item::network(&position(1)),
        Item::network(&position(1)),
        Item::network(&position(2)),
    ];
    let page = Arc::new(ScriptedPage::with_network(items, ctx.clone()));

    let summary = controller(&page, &ctx, &config, CancellationToken::new())
        .run()
        .await
        .unwrap();

    assert_eq!(payloads(&rows(&config).await), vec![position(1), position(2)]);
    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.failed_iterations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_ceiling_resets_instead_of_stopping() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(&dir, 1);
    assert_eq!(config.failure_ceiling, 5);
    let ctx = Arc::new(SessionContext::new());
    let mut items: Vec<Item> = (0..7).map(|_| Item::silent()).collect();
    items.push(Item::network(&position(1)));
    let page = Arc::new(ScriptedPage::with_network(items, ctx.clone()));

    let summary = controller(&page, &ctx, &config, CancellationToken::new())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.ceiling_resets, 1);
    assert_eq!(summary.failed_iterations, 7);
    assert_eq!(summary.confirmed, 1);
    assert_eq!(ctx.state().consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_readiness_timeouts_count_toward_ceiling() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(&dir, 1);
    let ctx = Arc::new(SessionContext::new());
    let mut items: Vec<Item> = (0..5).map(|_| Item::not_ready()).collect();
    items.push(Item::network(&position(1)));
    let page = Arc::new(ScriptedPage::with_network(items, ctx.clone()));

    let summary = controller(&page, &ctx, &config, CancellationToken::new())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.ceiling_resets, 1);
    assert_eq!(summary.confirmed, 1);
    assert_eq!(page.probe_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_outcomes_are_written_back_to_rows() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(&dir, 2);
    let ctx = Arc::new(SessionContext::new());
    let items = vec![
        Item::network(&position(1))
            .choices(&["Nf3", "e4"])
            .verdict("Incorrect. The best move was e4"),
        Item::network(&position(2))
            .choices(&["O-O", "Qxh7#"])
            .verdict("Correct!"),
    ];
    let page = Arc::new(ScriptedPage::with_network(items, ctx.clone()));

    controller(&page, &ctx, &config, CancellationToken::new())
        .run()
        .await
        .unwrap();

    let rows = rows(&config).await;
    assert_eq!(rows[0].choices, ["Nf3".to_string(), "e4".to_string()]);
    assert_eq!(rows[0].answer, Some(2));
    assert_eq!(rows[1].choices, ["O-O".to_string(), "Qxh7#".to_string()]);
    assert_eq!(rows[1].answer, Some(1));

    let text = std::fs::read_to_string(&config.output).unwrap();
    assert!(text.starts_with("Index,Payload,Choice1,Choice2,Outcome\n"));
    assert!(text.contains(",Nf3,e4,Answer2\n"));
}

#[tokio::test(start_paused = true)]
async fn test_lost_session_flushes_and_fails() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(&dir, 5);
    let ctx = Arc::new(SessionContext::new());
    let items = vec![
        Item::network(&position(1)),
        Item::network(&position(2)),
        Item::network(&position(3)),
    ];
    let page = Arc::new(ScriptedPage::with_network(items, ctx.clone()));
    page.configure(|s| s.lose_session_at = Some(1));

    let result = controller(&page, &ctx, &config, CancellationToken::new())
        .run()
        .await;

    assert!(matches!(result, Err(HarvestError::SessionLost(_))));
    assert_eq!(payloads(&rows(&config).await), vec![position(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_still_writes_store() {
    let dir = TempDir::new().unwrap();
    let config = harvest_config(&dir, 5);
    let ctx = Arc::new(SessionContext::new());
    let page = Arc::new(ScriptedPage::with_network(
        vec![Item::network(&position(1))],
        ctx.clone(),
    ));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = controller(&page, &ctx, &config, cancel)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.stop, StopReason::Cancelled);
    assert_eq!(summary.iterations, 0);
    assert!(rows(&config).await.is_empty());
    assert!(page.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unwritable_output_fails_before_touching_page() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();

    let mut config = harvest_config(&dir, 1);
    config.output = blocker.join("positions.csv").display().to_string();
    let ctx = Arc::new(SessionContext::new());
    let page = Arc::new(ScriptedPage::with_network(
        vec![Item::network(&position(1))],
        ctx.clone(),
    ));

    let result = controller(&page, &ctx, &config, CancellationToken::new())
        .run()
        .await;

    assert!(matches!(result, Err(HarvestError::Store(_))));
    assert!(page.clicks().is_empty());
}
