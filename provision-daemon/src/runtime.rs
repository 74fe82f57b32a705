use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

use provision_core::Settings;
use provision_graph::{log_failure, JobError};
use provision_sync::RunReport;

use crate::error::{io_err, DaemonError};
use crate::log_rotation::LogRotation;
use crate::paths::{logs_dir, run_dir, socket_path};
use crate::protocol::{DaemonRequest, DaemonResponse, CMD_RUN, CMD_STATUS, CMD_STOP};

/// One provisioning run, as the daemon sees it.
pub trait Job: Send + Sync + 'static {
    fn execute(&self) -> Result<RunReport, JobError>;
}

/// Runs the configured job; settings are re-read on every execution.
#[derive(Debug, Clone)]
pub struct ConfiguredJob {
    config: Option<PathBuf>,
}

impl ConfiguredJob {
    pub fn new(config: Option<PathBuf>) -> Self {
        Self { config }
    }
}

impl Job for ConfiguredJob {
    fn execute(&self) -> Result<RunReport, JobError> {
        provision_graph::execute(self.config.as_deref(), Utc::now())
    }
}

struct RunRequest {
    source: &'static str,
    respond_to: oneshot::Sender<Result<RunSummary, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub duration_ms: u64,
    pub report: RunReport,
}

/// Outcome history shown by `status`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunHistory {
    pub runs_ok: u64,
    pub runs_failed: u64,
    pub last_run_at_unix: u64,
    pub last_success_at_unix: u64,
    pub last_error: Option<String>,
    pub last_report: Option<RunReport>,
}

/// Start the daemon runtime and block the current thread until it exits.
///
/// Settings are validated once up front so a broken configuration fails the
/// start instead of every scheduled run.
pub fn start_blocking(home: &Path, config: Option<PathBuf>) -> Result<(), DaemonError> {
    ensure_runtime_dirs(home)?;
    crate::logging::init_files(home);
    let settings = Settings::load(config.as_deref())?;
    tracing::info!(
        interval_secs = settings.sync_interval.as_secs(),
        group = %settings.group_id,
        "daemon starting"
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(
        home.to_path_buf(),
        Arc::new(ConfiguredJob::new(config)),
        settings.sync_interval,
    ))
}

/// Run the daemon runtime.
pub async fn run<J: Job>(home: PathBuf, job: Arc<J>, interval: Duration) -> Result<(), DaemonError> {
    ensure_runtime_dirs(&home)?;

    let history = Arc::new(RwLock::new(RunHistory::default()));
    let started_at_unix = unix_seconds_now();

    let (run_tx, run_rx) = mpsc::channel::<RunRequest>(16);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let run_tx = run_tx.clone();
        tokio::spawn(async move {
            let result = scheduler_task(interval, run_tx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let history = history.clone();
        tokio::spawn(async move {
            let result = run_processor_task(job, history, run_rx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        let history = history.clone();
        let run_tx = run_tx.clone();
        tokio::spawn(async move {
            let result = socket_server_task(
                home,
                history,
                run_tx,
                shutdown.clone(),
                shutdown.subscribe(),
                started_at_unix,
                interval,
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let rotation_handle = {
        let shutdown = shutdown_tx.clone();
        let home = home.clone();
        tokio::spawn(async move {
            let result = log_rotation_task(home, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    drop(run_tx);

    let (scheduler_result, processor_result, socket_result, rotation_result, signal_result) =
        tokio::join!(
            scheduler_handle,
            processor_handle,
            socket_handle,
            rotation_handle,
            signal_handle
        );

    handle_join("scheduler", scheduler_result)?;
    handle_join("run_processor", processor_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("log_rotation", rotation_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!("daemon stopped");
    Ok(())
}

/// Enqueue a run on every tick. The first tick fires immediately; ticks
/// missed while a run is in flight are skipped, not replayed.
async fn scheduler_task(
    interval: Duration,
    run_tx: mpsc::Sender<RunRequest>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                match enqueue_run(&run_tx, "schedule").await {
                    Ok(summary) => tracing::debug!(duration_ms = summary.duration_ms, "scheduled run finished"),
                    Err(DaemonError::ChannelClosed(_)) => break,
                    // Already logged by the processor.
                    Err(_) => {}
                }
            }
        }
    }
    Ok(())
}

/// Single consumer of the run queue: at most one run executes at a time.
async fn run_processor_task<J: Job>(
    job: Arc<J>,
    history: Arc<RwLock<RunHistory>>,
    mut run_rx: mpsc::Receiver<RunRequest>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_request = run_rx.recv() => {
                let Some(request) = maybe_request else { break };
                let started = Instant::now();
                let started_unix = unix_seconds_now();
                tracing::info!(source = request.source, "run starting");

                let job = job.clone();
                let result = match tokio::task::spawn_blocking(move || job.execute()).await {
                    Ok(Ok(report)) => Ok(report),
                    Ok(Err(err)) => {
                        log_failure(&err);
                        Err(err.to_string())
                    }
                    // A panicking run is a failed run; the processor keeps serving.
                    Err(join_err) => {
                        let message = format!("run aborted: {join_err}");
                        tracing::error!(kind = "panic", error = %message, "provisioning run failed");
                        Err(message)
                    }
                };

                let outcome = {
                    let mut history = history.write().await;
                    history.last_run_at_unix = started_unix;
                    match result {
                        Ok(report) => {
                            history.runs_ok += 1;
                            history.last_success_at_unix = started_unix;
                            history.last_error = None;
                            history.last_report = Some(report.clone());
                            Ok(RunSummary {
                                source: request.source.to_string(),
                                duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                                report,
                            })
                        }
                        Err(message) => {
                            history.runs_failed += 1;
                            history.last_error = Some(message.clone());
                            Err(message)
                        }
                    }
                };

                let _ = request.respond_to.send(outcome);
            }
        }
    }

    Ok(())
}

async fn socket_server_task(
    home: PathBuf,
    history: Arc<RwLock<RunHistory>>,
    run_tx: mpsc::Sender<RunRequest>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
    started_at_unix: u64,
    interval: Duration,
) -> Result<(), DaemonError> {
    let run = run_dir(&home);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }

    let socket = socket_path(&home);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let home = home.clone();
                let history = history.clone();
                let run_tx = run_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(
                        stream,
                        home,
                        history,
                        run_tx,
                        shutdown_tx,
                        started_at_unix,
                        interval,
                    ).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    home: PathBuf,
    history: Arc<RwLock<RunHistory>>,
    run_tx: mpsc::Sender<RunRequest>,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
    interval: Duration,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: DaemonRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };
        let response = match request.cmd.as_str() {
            CMD_STATUS => {
                let payload = build_status_payload(&home, history.clone(), started_at_unix, interval).await;
                DaemonResponse::ok(payload)
            }
            CMD_RUN => match enqueue_run(&run_tx, "socket").await {
                Ok(summary) => DaemonResponse::ok(json!(summary)),
                Err(err) => DaemonResponse::error(err.to_string()),
            },
            CMD_STOP => {
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
            other => DaemonResponse::error(format!("unknown command '{other}'")),
        };
        write_response(&mut writer, &response).await?;
        if request.cmd == CMD_STOP {
            break;
        }
    }
    Ok(())
}

async fn build_status_payload(
    home: &Path,
    history: Arc<RwLock<RunHistory>>,
    started_at_unix: u64,
    interval: Duration,
) -> Value {
    // Snapshot under the read lock, serialize after it is dropped.
    let snapshot = history.read().await.clone();
    json!({
        "running": true,
        "pid": std::process::id(),
        "started_at_unix": started_at_unix,
        "interval_secs": interval.as_secs(),
        "runs_ok": snapshot.runs_ok,
        "runs_failed": snapshot.runs_failed,
        "last_run_at_unix": snapshot.last_run_at_unix,
        "last_success_at_unix": snapshot.last_success_at_unix,
        "last_error": snapshot.last_error,
        "last_report": snapshot.last_report,
        "socket": socket_path(home).display().to_string(),
        "logs": logs_dir(home).display().to_string(),
    })
}

async fn enqueue_run(
    run_tx: &mpsc::Sender<RunRequest>,
    source: &'static str,
) -> Result<RunSummary, DaemonError> {
    let (tx, rx) = oneshot::channel();
    run_tx
        .send(RunRequest {
            source,
            respond_to: tx,
        })
        .await
        .map_err(|_| DaemonError::ChannelClosed("run queue"))?;
    let outcome = rx
        .await
        .map_err(|_| DaemonError::ChannelClosed("run response"))?;
    outcome.map_err(DaemonError::Protocol)
}

async fn log_rotation_task(
    home: PathBuf,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(Duration::from_secs(5));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the first immediate tick

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let home = home.clone();
                // Failures are logged inside rotate_all.
                tokio::task::spawn_blocking(move || {
                    LogRotation::default().rotate_all(&home);
                })
                .await
                .ok();
            }
        }
    }
    Ok(())
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    for dir in [run_dir(home), logs_dir(home)] {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
    }
    Ok(())
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use provision_sync::{EnrollmentReport, RemoteError, SyncMode};
    use tempfile::TempDir;

    fn report() -> RunReport {
        RunReport {
            started_at: Utc::now(),
            mode: SyncMode::Incremental,
            pages: 1,
            records_seen: 0,
            tombstones: 0,
            lookup_failures: 0,
            ineligible: 0,
            candidates: Vec::new(),
            enrollment: EnrollmentReport::default(),
            invited: 0,
            cursor_fingerprint: Some("abc123def456".into()),
            duration_ms: 1,
        }
    }

    /// Succeeds, except every `fail_every`-th call fails authentication.
    struct CountingJob {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail_every: usize,
    }

    impl CountingJob {
        fn new(fail_every: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                fail_every,
            }
        }
    }

    impl Job for CountingJob {
        fn execute(&self) -> Result<RunReport, JobError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_every != 0 && n % self.fail_every == 0 {
                return Err(JobError::Authentication(RemoteError::transport("token endpoint down")));
            }
            Ok(report())
        }
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn scheduler_enqueues_once_per_interval() {
        let (run_tx, mut run_rx) = mpsc::channel::<RunRequest>(4);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let interval = Duration::from_secs(600);
        let handle = tokio::spawn(scheduler_task(interval, run_tx, shutdown_tx.subscribe()));

        let start = Instant::now();
        for _ in 0..3 {
            let request = run_rx.recv().await.expect("scheduled run");
            assert_eq!(request.source, "schedule");
            let _ = request.respond_to.send(Err("not executed in test".into()));
        }
        assert_eq!(start.elapsed(), Duration::from_secs(1200));

        shutdown_tx.send(()).expect("shutdown");
        handle.await.expect("join").expect("scheduler result");
    }

    #[tokio::test(start_paused = true, flavor = "current_thread")]
    async fn scheduler_skips_ticks_missed_during_a_long_run() {
        let (run_tx, mut run_rx) = mpsc::channel::<RunRequest>(4);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let handle = tokio::spawn(scheduler_task(Duration::from_secs(60), run_tx, shutdown_tx.subscribe()));

        let first = run_rx.recv().await.expect("first run");
        // The run takes five intervals.
        tokio::time::advance(Duration::from_secs(300)).await;
        let _ = first.respond_to.send(Err("slow".into()));

        let second = run_rx.recv().await.expect("second run");
        let _ = second.respond_to.send(Err("done".into()));
        assert!(run_rx.try_recv().is_err(), "missed ticks must not burst");

        shutdown_tx.send(()).expect("shutdown");
        handle.await.expect("join").expect("scheduler result");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn processor_runs_one_job_at_a_time_and_records_history() {
        let job = Arc::new(CountingJob::new(3));
        let history = Arc::new(RwLock::new(RunHistory::default()));
        let (run_tx, run_rx) = mpsc::channel::<RunRequest>(8);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let processor = tokio::spawn(run_processor_task(
            job.clone(),
            history.clone(),
            run_rx,
            shutdown_tx.subscribe(),
        ));

        let mut waits = Vec::new();
        for _ in 0..3 {
            let tx = run_tx.clone();
            waits.push(tokio::spawn(async move { enqueue_run(&tx, "socket").await }));
        }
        let mut ok = 0;
        let mut failed = 0;
        for wait in waits {
            match wait.await.expect("join") {
                Ok(_) => ok += 1,
                Err(_) => failed += 1,
            }
        }

        assert_eq!((ok, failed), (2, 1));
        assert_eq!(job.max_in_flight.load(Ordering::SeqCst), 1);
        let snapshot = history.read().await.clone();
        assert_eq!(snapshot.runs_ok, 2);
        assert_eq!(snapshot.runs_failed, 1);

        shutdown_tx.send(()).expect("shutdown");
        processor.await.expect("join").expect("processor result");
    }

    #[test]
    fn status_payload_before_any_run() {
        let home = TempDir::new().expect("home");
        let history = Arc::new(RwLock::new(RunHistory::default()));

        let payload = tokio_test::block_on(build_status_payload(
            home.path(),
            history,
            1_000_000,
            Duration::from_secs(600),
        ));

        assert_eq!(payload["running"], json!(true));
        assert_eq!(payload["started_at_unix"], json!(1_000_000u64));
        assert_eq!(payload["interval_secs"], json!(600u64));
        assert_eq!(payload["runs_ok"], json!(0u64));
        assert_eq!(payload["last_report"], Value::Null);
    }

    /// Panics on the first call, succeeds afterwards.
    struct PanicOnceJob {
        calls: AtomicUsize,
    }

    impl Job for PanicOnceJob {
        fn execute(&self) -> Result<RunReport, JobError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("adapter bug");
            }
            Ok(report())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_run_is_recorded_and_next_run_is_served() {
        let job = Arc::new(PanicOnceJob {
            calls: AtomicUsize::new(0),
        });
        let history = Arc::new(RwLock::new(RunHistory::default()));
        let (run_tx, run_rx) = mpsc::channel::<RunRequest>(4);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let processor = tokio::spawn(run_processor_task(
            job,
            history.clone(),
            run_rx,
            shutdown_tx.subscribe(),
        ));

        let first = enqueue_run(&run_tx, "socket").await.unwrap_err();
        assert!(first.to_string().contains("run aborted"), "got: {first}");

        let second = enqueue_run(&run_tx, "socket").await.expect("second run served");
        assert_eq!(second.report.pages, 1);

        let snapshot = history.read().await.clone();
        assert_eq!(snapshot.runs_failed, 1);
        assert_eq!(snapshot.runs_ok, 1);
        assert_eq!(snapshot.last_error, None);

        shutdown_tx.send(()).expect("shutdown");
        processor.await.expect("join").expect("processor result");
    }

    #[tokio::test]
    async fn status_payload_carries_last_report() {
        let home = TempDir::new().expect("home");
        let history = Arc::new(RwLock::new(RunHistory {
            runs_ok: 4,
            last_report: Some(report()),
            ..RunHistory::default()
        }));

        let payload = build_status_payload(home.path(), history, 0, Duration::from_secs(60)).await;
        assert_eq!(payload["runs_ok"], json!(4u64));
        assert_eq!(payload["last_report"]["mode"], json!("incremental"));
        assert_eq!(payload["last_report"]["cursor_fingerprint"], json!("abc123def456"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn socket_status_run_and_stop() {
        let home = TempDir::new().expect("home");
        let home_path = home.path().to_path_buf();
        let job = Arc::new(CountingJob::new(0));

        let daemon = tokio::spawn(run(home_path.clone(), job.clone(), Duration::from_secs(3600)));

        let client_home = home_path.clone();
        let (status, run_data) = tokio::task::spawn_blocking(move || {
            let status = crate::protocol::request_status(&client_home).expect("status");
            let run_data = crate::protocol::request_run(&client_home).expect("run");
            crate::protocol::request_stop(&client_home).expect("stop");
            (status, run_data)
        })
        .await
        .expect("client");

        assert_eq!(status["running"], json!(true));
        assert_eq!(run_data["source"], json!("socket"));
        assert_eq!(run_data["report"]["pages"], json!(1));

        daemon.await.expect("join").expect("daemon result");
        assert!(job.calls.load(Ordering::SeqCst) >= 2, "startup run plus run-now");
        assert!(!socket_path(&home_path).exists(), "socket removed on shutdown");
    }
}
