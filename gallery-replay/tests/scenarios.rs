//! Bundled Scenario Tests
//!
//! Replays the scenario files shipped in `scenarios/` through the library
//! API and checks where each viewer comes to rest.

use std::path::PathBuf;

use gallery_core::SwipeOutcome;
use gallery_replay::{run, ReplayError, ReplayReport, Scenario, Step, DEFAULT_FRAME_MS};
use proptest::prelude::*;

fn scenario(name: &str) -> Scenario {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(format!("{name}.json"));
    Scenario::load(path).unwrap()
}

async fn replay(name: &str) -> ReplayReport {
    run(&scenario(name), DEFAULT_FRAME_MS).await.unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// ============================================================================
// Bundled scenarios
// ============================================================================

#[tokio::test]
async fn test_pinch_pan_springs_back_to_edge() {
    let report = replay("pinch-pan").await;
    let last = report.last_frame().unwrap();
    assert!(close(last.transform.scale, 2.0));
    // 400x300 at 2x is 750 wide in a 375 window: the edge is at 187.5
    assert!(close(last.transform.translate_x, 187.5));
    // 562.5 tall in a 667 window cannot pan vertically
    assert!(close(last.transform.translate_y, 0.0));
    assert!(report
        .frames
        .iter()
        .any(|f| f.transform.translate_x > 187.5));
}

#[tokio::test]
async fn test_pager_swipe_commits_once() {
    let report = replay("pager-swipe").await;
    assert_eq!(report.index_changes, vec![1]);
    let last = report.last_frame().unwrap();
    assert_eq!(last.pager.index, 1);
    assert_eq!(last.pager.active_index, 1);
    assert!(close(last.pager.translate_x, -402.0));
}

#[tokio::test]
async fn test_swipe_dismiss_then_close() {
    let report = replay("swipe-dismiss").await;

    assert!(report
        .frames
        .iter()
        .filter_map(|f| f.lightbox)
        .any(|l| close(l.progress, 1.0)));

    assert_eq!(report.releases.len(), 1);
    let release = report.releases[0];
    assert_eq!(release.outcome, SwipeOutcome::Dismissed);
    assert!(close(release.velocity, 1200.0));

    let last = report.last_frame().unwrap();
    assert!(last.swipe.translate_y >= 667.0 + 100.0);
    assert!(close(last.swipe.backdrop_opacity.unwrap(), 0.0));
    assert!(close(last.lightbox.unwrap().progress, 0.0));
    assert!(report.closed);
}

// ============================================================================
// Runner
// ============================================================================

#[tokio::test]
async fn test_rejects_non_positive_frame_interval() {
    let result = run(&scenario("pinch-pan"), 0.0).await;
    assert!(matches!(result, Err(ReplayError::Invalid(_))));
}

#[tokio::test]
async fn test_text_line_per_frame() {
    let report = replay("pager-swipe").await;
    let line = report.frames[0].to_string();
    assert!(line.starts_with("#1"));
    assert!(line.contains("page=0/0"));
    assert!(line.contains("backdrop=1.000"));
}

#[tokio::test]
async fn test_zoomed_image_blocks_dismiss() {
    let mut scenario = scenario("pinch-pan");
    scenario.steps.truncate(6);
    let mut swipe: Vec<Step> = serde_json::from_str(
        r#"[
            { "kind": "settle" },
            { "kind": "gesture", "target": "swipe", "old_state": "undetermined", "state": "began",
              "velocity_y": 900 },
            { "kind": "gesture", "target": "swipe", "old_state": "began", "state": "active",
              "translation_y": 200, "velocity_y": 900 },
            { "kind": "gesture", "target": "swipe", "old_state": "active", "state": "end",
              "translation_y": 200, "velocity_y": 900 },
            { "kind": "settle" }
        ]"#,
    )
    .unwrap();
    scenario.steps.append(&mut swipe);

    let report = run(&scenario, DEFAULT_FRAME_MS).await.unwrap();
    assert!(report.releases.is_empty());
    assert!(close(report.last_frame().unwrap().swipe.translate_y, 0.0));
}

proptest! {
    #[test]
    fn prop_advance_records_every_frame(frames in 1usize..40, frame_ms in 1.0f64..50.0) {
        let mut scenario = scenario("pinch-pan");
        scenario.steps = vec![Step::Advance { frames }];
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let report = rt.block_on(run(&scenario, frame_ms)).unwrap();

        prop_assert_eq!(report.frames.len(), frames);
        for (i, frame) in report.frames.iter().enumerate() {
            prop_assert_eq!(frame.frame, i as u64 + 1);
            prop_assert!((frame.time - frame_ms * (i as f64 + 1.0)).abs() < 1e-6);
        }
    }
}
