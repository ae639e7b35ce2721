//! One feed dying does not take the dashboard down: the connections
//! session exhausts its reconnect budget and surfaces a terminal bus
//! event, while the log feed and the command channel keep working.

use std::time::Duration;

use pxd_runtime::{Dashboard, DashboardCommand, DashboardOptions, FeedKind, RuntimeEvent};
use pxd_schemas::TrafficSnapshot;
use pxd_stream::{SessionOptions, SessionState};
use pxd_testkit::{log_line, ConnectOutcome, ScriptedTransport};
use tokio::time::timeout;

fn fast_options() -> DashboardOptions {
    DashboardOptions {
        session: SessionOptions {
            retry_delay: Duration::from_millis(1),
            ..SessionOptions::default()
        },
        ..DashboardOptions::default()
    }
}

#[tokio::test(start_paused = true)]
async fn connections_terminal_leaves_logs_and_commands_alive() {
    let connections = ScriptedTransport::<TrafficSnapshot>::new(vec![
        ConnectOutcome::Refuse("connection refused".to_string()),
        ConnectOutcome::Refuse("connection refused".to_string()),
        ConnectOutcome::Refuse("connection refused".to_string()),
    ]);
    let logs = ScriptedTransport::new(vec![ConnectOutcome::DeliverThenHang(vec![
        log_line("info", "engine started"),
        log_line("warning", "upstream slow"),
    ])]);

    let dashboard = Dashboard::launch(connections.clone(), logs, fast_options());
    let mut bus = dashboard.subscribe();

    // Watch the connections session walk its state machine into Closed.
    let mut saw_reconnecting = false;
    let terminal = timeout(Duration::from_secs(5), async {
        loop {
            match bus.recv().await.expect("bus open") {
                RuntimeEvent::Session {
                    feed: FeedKind::Connections,
                    state: SessionState::Reconnecting,
                } => saw_reconnecting = true,
                RuntimeEvent::Terminal {
                    feed: FeedKind::Connections,
                    message,
                } => return message,
                _ => continue,
            }
        }
    })
    .await
    .expect("terminal event");

    assert!(saw_reconnecting, "retries must be visible as Reconnecting");
    assert!(terminal.contains("3 reconnect attempts"));
    assert_eq!(connections.connect_calls(), 3);

    // The log feed is untouched by the dead connections session.
    let mut log_frames = dashboard.log_frames();
    let logs_frame = timeout(Duration::from_secs(5), async {
        loop {
            {
                let frame = log_frames.borrow_and_update();
                if frame.records.len() == 2 {
                    return frame.clone();
                }
            }
            log_frames.changed().await.expect("log publisher alive");
        }
    })
    .await
    .expect("log lines should still arrive");
    assert_eq!(logs_frame.records[0].payload, "engine started");

    // And the command path still drains.
    assert!(dashboard.command(DashboardCommand::ClearLogs).await);
    let cleared = timeout(Duration::from_secs(5), async {
        loop {
            {
                let frame = log_frames.borrow_and_update();
                if frame.records.is_empty() {
                    return true;
                }
            }
            log_frames.changed().await.expect("log publisher alive");
        }
    })
    .await
    .expect("clear should publish");
    assert!(cleared);

    dashboard.shutdown().await;
}
