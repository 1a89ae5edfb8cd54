//! ---
//! wd_section: "15-testing-qa"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Out-of-order poll resolution tests against a slow stub backend."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use wattdash_common::config::DashboardConfig;
use wattdash_core::{ConnectionState, DashboardController, DashboardHandle};

const DELAYED_WATTS: f64 = 1_111.0;
const FRESH_WATTS: f64 = 2_222.0;

/// Stub backend whose very first analyze response is held back long enough
/// for several later polls to resolve first.
#[derive(Clone)]
struct SlowFirstReply {
    analyze_hits: Arc<AtomicU64>,
    delay: Duration,
}

impl SlowFirstReply {
    async fn serve(&self) -> SocketAddr {
        let app = Router::new()
            .route("/api/analyze", post(analyze))
            .route(
                "/api/forecast",
                get(|| async { Json(serde_json::json!({ "forecast": [] })) }),
            )
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }
}

async fn analyze(State(stub): State<SlowFirstReply>) -> Response {
    let hit = stub.analyze_hits.fetch_add(1, Ordering::SeqCst) + 1;
    let watts = if hit == 1 {
        tokio::time::sleep(stub.delay).await;
        DELAYED_WATTS
    } else {
        FRESH_WATTS
    };
    Json(sample_payload(watts)).into_response()
}

fn sample_payload(watts: f64) -> serde_json::Value {
    let stamp = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string();
    serde_json::json!({
        "timestamp": stamp,
        "total_consumption": watts,
        "nilm": [
            { "name": "Refrigerator", "is_running": true, "power_draw": 150.0 },
        ],
        "anomaly": {
            "timestamp": stamp,
            "value": watts,
            "is_anomaly": false,
            "deviation": 0.1,
            "message": "Normal",
        },
    })
}

async fn start_dashboard(
    addr: SocketAddr,
    registry: wattdash_core::SharedRegistry,
) -> DashboardHandle {
    let config: DashboardConfig = format!(
        "[backend]\nbase_url = \"http://{addr}\"\npoll_interval = 60\nrequest_timeout = 2000\n"
    )
    .parse()
    .unwrap();
    DashboardController::new(config, Some(registry))
        .unwrap()
        .start()
        .await
        .unwrap()
}

#[tokio::test]
async fn a_delayed_early_poll_never_overwrites_a_later_one() {
    let registry = wattdash_core::new_registry();
    let stub = SlowFirstReply {
        analyze_hits: Arc::new(AtomicU64::new(0)),
        delay: Duration::from_millis(300),
    };
    let addr = stub.serve().await;
    let handle = start_dashboard(addr, registry.clone()).await;

    // poll #2 resolves while poll #1 is still held back
    for _ in 0..300 {
        let snapshot = handle.snapshot();
        if snapshot
            .current
            .as_ref()
            .map(|s| s.total_consumption == FRESH_WATTS)
            .unwrap_or(false)
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // wait out the delayed resolution of poll #1, then some
    tokio::time::sleep(Duration::from_millis(450)).await;

    let snapshot = handle.snapshot();
    assert_eq!(
        snapshot.current.as_ref().map(|s| s.total_consumption),
        Some(FRESH_WATTS),
        "a stale resolution must not become `current`"
    );
    assert!(
        snapshot
            .history
            .iter()
            .all(|sample| sample.total_consumption != DELAYED_WATTS),
        "a stale resolution must never enter the history"
    );
    assert_eq!(snapshot.connection, ConnectionState::Live);
    assert!(stale_discards(&registry) >= 1.0);

    handle.shutdown().await.unwrap();
}

fn stale_discards(registry: &prometheus::Registry) -> f64 {
    registry
        .gather()
        .iter()
        .find(|family| family.get_name() == "wattdash_stale_responses_total")
        .map(|family| family.get_metric()[0].get_counter().get_value())
        .unwrap_or(0.0)
}
