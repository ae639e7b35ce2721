//! Dashboard assembly: two sessions, one event loop, one owner.
//!
//! The loop task is the sole writer of [`LiveView`] and [`LogFeed`].
//! Session events and sink commands converge on its `select!`; everything
//! downstream reads published `watch` state. Dropping the [`Dashboard`]
//! (or calling [`shutdown`][Dashboard::shutdown]) closes the command
//! channel, which ends the loop and tears both sessions down.

use pxd_config::ConnectionInfo;
use pxd_match::FilterSpec;
use pxd_schemas::{LogRecord, TrafficSnapshot};
use pxd_stream::{SessionOptions, StreamSession, StreamTransport, WsTransport};
use pxd_view::{SortPolicy, ViewFrame};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use crate::{LiveView, LogFeed, LogFrame, LogLevelFilter, RuntimeEvent, DEFAULT_LOG_CAPACITY};

// ---------------------------------------------------------------------------
// Options & commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Applied to both feed sessions.
    pub session: SessionOptions,
    /// Log buffer retention.
    pub log_capacity: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            session: SessionOptions::default(),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

/// Sink-side requests, applied by the loop task in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCommand {
    SetFilter(FilterSpec),
    SetSort(SortPolicy),
    SetLogFilter(FilterSpec),
    SetLogLevel(LogLevelFilter),
    PauseLogs,
    ResumeLogs,
    ClearLogs,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Owner handle for a running dashboard core.
pub struct Dashboard {
    commands: mpsc::Sender<DashboardCommand>,
    frames: watch::Receiver<ViewFrame>,
    log_frames: watch::Receiver<LogFrame>,
    bus: broadcast::Sender<RuntimeEvent>,
    task: tokio::task::JoinHandle<()>,
}

impl Dashboard {
    /// Subscribe to the engine at `info` and launch the core.
    ///
    /// The caller holds the "no connection info ⇒ no subscription" branch:
    /// only call this once info exists.
    pub fn connect(info: &ConnectionInfo, opts: DashboardOptions) -> Dashboard {
        info!(server = %info.server, "starting dashboard session");
        let connections: WsTransport<TrafficSnapshot> =
            WsTransport::new(info.endpoint("connections"));
        let logs: WsTransport<LogRecord> = WsTransport::new(info.endpoint("logs"));
        Self::launch(connections, logs, opts)
    }

    /// Launch over explicit transports (tests script these).
    pub fn launch<Ct, Lt>(connections: Ct, logs: Lt, opts: DashboardOptions) -> Dashboard
    where
        Ct: StreamTransport<TrafficSnapshot> + 'static,
        Lt: StreamTransport<LogRecord> + 'static,
    {
        let (bus, _keepalive) = broadcast::channel(64);
        let (view, frames) = LiveView::new(bus.clone());
        let (feed, log_frames) = LogFeed::with_capacity(opts.log_capacity, bus.clone());

        let (conn_session, conn_events) = StreamSession::spawn(connections, opts.session.clone());
        let (log_session, log_events) = StreamSession::spawn(logs, opts.session);

        let (commands, command_rx) = mpsc::channel(16);
        let task = tokio::spawn(run_loop(
            view,
            feed,
            conn_session,
            conn_events,
            log_session,
            log_events,
            command_rx,
        ));

        Dashboard {
            commands,
            frames,
            log_frames,
            bus,
            task,
        }
    }

    /// Live view frames (connections page).
    pub fn frames(&self) -> watch::Receiver<ViewFrame> {
        self.frames.clone()
    }

    /// Live log frames (logs page).
    pub fn log_frames(&self) -> watch::Receiver<LogFrame> {
        self.log_frames.clone()
    }

    /// Out-of-band events: filter rejections, session states, terminals.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.bus.subscribe()
    }

    /// The bus as a `Stream`, for sinks built on futures combinators.
    pub fn event_stream(&self) -> BroadcastStream<RuntimeEvent> {
        BroadcastStream::new(self.bus.subscribe())
    }

    /// Queue one command. Returns `false` when the core is already gone.
    pub async fn command(&self, command: DashboardCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn set_filter(&self, spec: FilterSpec) -> bool {
        self.command(DashboardCommand::SetFilter(spec)).await
    }

    pub async fn set_sort(&self, sort: SortPolicy) -> bool {
        self.command(DashboardCommand::SetSort(sort)).await
    }

    /// End the session: stop the loop and release both transports.
    pub async fn shutdown(self) {
        let Dashboard { commands, task, .. } = self;
        drop(commands);
        let _ = task.await;
    }
}

// ---------------------------------------------------------------------------
// Loop task
// ---------------------------------------------------------------------------

async fn run_loop(
    mut view: LiveView,
    mut feed: LogFeed,
    conn_session: StreamSession,
    mut conn_events: mpsc::Receiver<pxd_stream::SessionEvent<TrafficSnapshot>>,
    log_session: StreamSession,
    mut log_events: mpsc::Receiver<pxd_stream::SessionEvent<LogRecord>>,
    mut commands: mpsc::Receiver<DashboardCommand>,
) {
    let mut conn_open = true;
    let mut logs_open = true;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => apply_command(&mut view, &mut feed, command),
                // Owner dropped the handle: tear everything down.
                None => break,
            },
            event = conn_events.recv(), if conn_open => match event {
                Some(event) => view.handle_event(event),
                // Session ended (terminal error already surfaced); keep
                // serving commands and the other feed.
                None => conn_open = false,
            },
            event = log_events.recv(), if logs_open => match event {
                Some(event) => feed.handle_event(event),
                None => logs_open = false,
            },
        }
    }

    conn_session.close().await;
    log_session.close().await;
    info!("dashboard session stopped");
}

fn apply_command(view: &mut LiveView, feed: &mut LogFeed, command: DashboardCommand) {
    match command {
        DashboardCommand::SetFilter(spec) => view.set_filter(spec),
        DashboardCommand::SetSort(sort) => view.set_sort(sort),
        DashboardCommand::SetLogFilter(spec) => feed.set_filter(spec),
        DashboardCommand::SetLogLevel(level) => feed.set_level(level),
        DashboardCommand::PauseLogs => feed.pause(),
        DashboardCommand::ResumeLogs => feed.resume(),
        DashboardCommand::ClearLogs => feed.clear(),
    }
}
