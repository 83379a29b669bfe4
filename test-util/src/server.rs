//! Test server harness used by integration suites.
//!
//! Provides helpers to launch the gateway server binary with either the
//! `SQLite` or `PostgreSQL` backend, monitor readiness, and tear it down once
//! tests complete.

use std::{
    ffi::OsString,
    fmt,
    io::{self, BufRead, BufReader},
    net::TcpListener,
    path::Path,
    process::{Child, Command, Stdio},
    sync::Mutex,
    time::{Duration, Instant},
};

#[cfg(unix)]
use nix::{
    sys::signal::{Signal, kill},
    unistd::Pid,
};
use tempfile::TempDir;

use crate::AnyError;
#[cfg(feature = "postgres")]
use crate::postgres::PostgresTestDb;

/// Newtype wrapping the path to a Cargo manifest, providing type-safe handling
/// and ergonomic conversions.
#[derive(Debug, Clone)]
pub struct ManifestPath(String);

impl ManifestPath {
    /// Constructs a new manifest path from any string-like type.
    pub fn new(path: impl Into<String>) -> Self { Self(path.into()) }
    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for ManifestPath {
    fn from(value: &str) -> Self { Self(value.to_owned()) }
}

impl From<String> for ManifestPath {
    fn from(value: String) -> Self { Self(value) }
}

impl AsRef<str> for ManifestPath {
    fn as_ref(&self) -> &str { &self.0 }
}

impl AsRef<Path> for ManifestPath {
    fn as_ref(&self) -> &Path { Path::new(&self.0) }
}

impl fmt::Display for ManifestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Newtype wrapping a database connection URL that provides ergonomic
/// conversions for type-safe handling.
#[derive(Debug, Clone)]
pub struct DbUrl(String);

impl DbUrl {
    /// Constructs a new database URL from any string-like type.
    pub fn new(url: impl Into<String>) -> Self { Self(url.into()) }
    /// Returns the URL as a string slice.
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for DbUrl {
    fn from(value: &str) -> Self { Self(value.to_owned()) }
}

impl From<String> for DbUrl {
    fn from(value: String) -> Self { Self(value) }
}

impl AsRef<str> for DbUrl {
    fn as_ref(&self) -> &str { &self.0 }
}

impl fmt::Display for DbUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Ensure `CARGO_BIN_EXE_frame-gateway` is populated from the provided
/// compile-time path.
///
/// The mutation is guarded by a global mutex and the result is propagated so
/// callers can handle synchronisation failures instead of panicking.
pub fn ensure_server_binary_env(bin_path: &str) -> Result<(), AnyError> {
    let _guard = ENV_LOCK
        .lock()
        .map_err(|_| io::Error::other("environment mutex poisoned"))?;
    if std::env::var_os("CARGO_BIN_EXE_frame-gateway").is_none() {
        // SAFETY: Environment mutation is serialized by `ENV_LOCK`, ensuring no
        // concurrent readers/writers observe a partially updated state.
        unsafe { std::env::set_var("CARGO_BIN_EXE_frame-gateway", bin_path) };
    }
    Ok(())
}

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("Either feature 'sqlite' or 'postgres' must be enabled");

#[inline]
fn ensure_single_backend() {
    const {
        assert!(
            !cfg!(all(feature = "sqlite", feature = "postgres")),
            "Choose either sqlite or postgres, not both",
        );
    }
}

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
fn setup_sqlite<F>(temp: &TempDir, setup: F) -> Result<DbUrl, AnyError>
where
    F: FnOnce(&DbUrl) -> Result<(), AnyError>,
{
    let path = temp.path().join("gateway.db");
    let path_str = path
        .to_str()
        .ok_or_else(|| "database path is not valid UTF-8".to_string())?;
    let url = DbUrl::from(path_str);
    setup(&url)?;
    Ok(url)
}

/// Waits up to ten seconds for the child server process to announce
/// readiness on stdout, returning an error if it exits early or never
/// signals.
fn wait_for_server(child: &mut Child) -> Result<(), AnyError> {
    if let Some(out) = &mut child.stdout {
        let mut reader = BufReader::new(out);
        let mut line = String::new();
        let timeout = Duration::from_secs(10);
        let start = Instant::now();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err("server exited before signalling readiness".into());
            }
            if line.contains("listening") {
                break;
            }
            if start.elapsed() > timeout {
                return Err("timeout waiting for server to signal readiness".into());
            }
        }
        Ok(())
    } else {
        Err("missing stdout from server".into())
    }
}

/// Inference backend wiring for a launched test server: either degraded
/// (pool size zero, no connect attempt) or pointed at a caller-supplied
/// address with one pooled client.
#[derive(Debug, Clone, Copy)]
enum InferenceBackend {
    Degraded,
    At(std::net::SocketAddr),
}

/// Constructs the base `cargo run` command for launching the server with the
/// requested manifest, bind port, and database URL, enabling the active backend.
fn build_server_command(
    manifest_path: &ManifestPath,
    port: u16,
    db_url: &DbUrl,
    inference: InferenceBackend,
    extra_env: &[(String, String)],
) -> Command {
    if let Some(bin) = std::env::var_os("CARGO_BIN_EXE_frame-gateway") {
        return server_binary_command(bin, port, db_url, inference, extra_env);
    }
    cargo_run_command(manifest_path, port, db_url, inference, extra_env)
}

/// Builds a command that executes an already-built server binary bound to
/// the requested port and database URL, bypassing `cargo run` entirely.
fn server_binary_command(
    bin: OsString,
    port: u16,
    db_url: &DbUrl,
    inference: InferenceBackend,
    extra_env: &[(String, String)],
) -> Command {
    let mut cmd = Command::new(bin);
    cmd.arg("--bind-frame");
    cmd.arg(format!("127.0.0.1:{port}"));
    cmd.arg("--bind-rest");
    cmd.arg(format!("127.0.0.1:{}", port + 1));
    cmd.arg("--bind-udp");
    cmd.arg(format!("127.0.0.1:{}", port + 2));
    cmd.arg("--database");
    cmd.arg(db_url.as_str());
    apply_test_env(&mut cmd, port, inference);
    for (key, value) in extra_env {
        cmd.env(key, value);
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
    cmd
}

/// Isolates the remote-log sink under a per-server temporary directory and
/// wires the inference pool per `inference`: degraded (so startup never
/// blocks on the connect-retry backoff) or pointed at a caller-supplied
/// mock backend with a single pooled client.
fn apply_test_env(cmd: &mut Command, port: u16, inference: InferenceBackend) {
    match inference {
        InferenceBackend::Degraded => {
            cmd.env("MXDGW_INFERENCE_POOL_SIZE", "0");
        }
        InferenceBackend::At(addr) => {
            cmd.env("MXDGW_INFERENCE_HOST", addr.ip().to_string());
            cmd.env("MXDGW_INFERENCE_PORT", addr.port().to_string());
            cmd.env("MXDGW_INFERENCE_POOL_SIZE", "1");
        }
    }
    cmd.env("MXDGW_LOG_DIR", std::env::temp_dir().join(format!("frame-gateway-test-logs-{port}")));
}

/// Produces a `cargo run` invocation tailored to the active backend, falling
/// back to this path when no prebuilt binary is available.
fn cargo_run_command(
    manifest_path: &ManifestPath,
    port: u16,
    db_url: &DbUrl,
    inference: InferenceBackend,
    extra_env: &[(String, String)],
) -> Command {
    let cargo: OsString = std::env::var_os("CARGO").unwrap_or_else(|| OsString::from("cargo"));
    let mut cmd = Command::new(cargo);
    cmd.arg("run");
    #[cfg(feature = "postgres")]
    {
        cmd.args(["--no-default-features", "--features", "postgres"]);
    }
    #[cfg(feature = "sqlite")]
    {
        cmd.args(["--features", "sqlite"]);
    }
    cmd.args([
        "--bin",
        "frame-gateway",
        "--manifest-path",
        manifest_path.as_str(),
        "--quiet",
        "--",
        "--bind-frame",
        &format!("127.0.0.1:{port}"),
        "--bind-rest",
        &format!("127.0.0.1:{}", port + 1),
        "--bind-udp",
        &format!("127.0.0.1:{}", port + 2),
        "--database",
        db_url.as_str(),
    ]);
    apply_test_env(&mut cmd, port, inference);
    for (key, value) in extra_env {
        cmd.env(key, value);
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
    cmd
}

/// Spawns the configured server process on ephemeral ports and waits for the
/// readiness banner before returning the child handle and chosen base port.
fn launch_server_process(
    manifest_path: &ManifestPath,
    db_url: &DbUrl,
    inference: InferenceBackend,
    extra_env: &[(String, String)],
) -> Result<(Child, u16), AnyError> {
    let socket = TcpListener::bind("127.0.0.1:0")?;
    let port = socket.local_addr()?.port();
    drop(socket);

    let mut child = build_server_command(manifest_path, port, db_url, inference, extra_env).spawn()?;
    if let Err(e) = wait_for_server(&mut child) {
        let _ = child.kill();
        let _ = child.wait();
        return Err(e);
    }
    Ok((child, port))
}

/// A running gateway server process, bound to ephemeral ports, torn down on drop.
pub struct TestServer {
    child: Child,
    frame_port: u16,
    db_url: DbUrl,
    #[cfg(feature = "postgres")]
    db: PostgresTestDb,
    temp_dir: Option<TempDir>,
}

impl TestServer {
    /// Start a server with an empty database.
    ///
    /// # Errors
    /// Returns an error if the database or server process cannot be started.
    pub fn start(manifest_path: impl Into<ManifestPath>) -> Result<Self, AnyError> {
        Self::start_with_setup(manifest_path, |_| Ok(()))
    }

    /// Start a server, running `setup` against the database URL before launch.
    ///
    /// # Errors
    /// Returns an error if the database or server process cannot be started,
    /// or `setup` fails.
    pub fn start_with_setup<F>(
        manifest_path: impl Into<ManifestPath>,
        setup: F,
    ) -> Result<Self, AnyError>
    where
        F: FnOnce(&DbUrl) -> Result<(), AnyError>,
    {
        Self::start_inner(manifest_path, setup, InferenceBackend::Degraded, &[])
    }

    /// Start a server wired to a live inference backend at `inference_addr`
    /// (one pooled client, no connect-retry backoff wasted on a dead port).
    ///
    /// Start the mock inference service before calling this, so the
    /// gateway's connect-with-retry succeeds on or near its first attempt.
    ///
    /// # Errors
    /// Returns an error if the database or server process cannot be started,
    /// or `setup` fails.
    pub fn start_with_inference<F>(
        manifest_path: impl Into<ManifestPath>,
        setup: F,
        inference_addr: std::net::SocketAddr,
    ) -> Result<Self, AnyError>
    where
        F: FnOnce(&DbUrl) -> Result<(), AnyError>,
    {
        Self::start_inner(manifest_path, setup, InferenceBackend::At(inference_addr), &[])
    }

    /// Start a server with an empty database and additional `MXDGW_*`
    /// environment overrides (e.g. a shortened UDP staleness horizon).
    ///
    /// # Errors
    /// Returns an error if the database or server process cannot be started.
    pub fn start_with_env(
        manifest_path: impl Into<ManifestPath>,
        extra_env: &[(String, String)],
    ) -> Result<Self, AnyError> {
        Self::start_inner(manifest_path, |_| Ok(()), InferenceBackend::Degraded, extra_env)
    }

    fn start_inner<F>(
        manifest_path: impl Into<ManifestPath>,
        setup: F,
        inference: InferenceBackend,
        extra_env: &[(String, String)],
    ) -> Result<Self, AnyError>
    where
        F: FnOnce(&DbUrl) -> Result<(), AnyError>,
    {
        let manifest_path = manifest_path.into();
        ensure_single_backend();
        #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
        {
            let temp = TempDir::new()?;
            let db_url = setup_sqlite(&temp, setup)?;
            Self::launch(&manifest_path, db_url, Some(temp), inference, extra_env)
        }

        #[cfg(feature = "postgres")]
        {
            let db = crate::postgres::PostgresTestDb::new()?;
            let db_url = DbUrl::from(db.url.as_ref());
            setup(&db_url)?;
            Self::launch(&manifest_path, db, db_url, inference, extra_env)
        }
    }

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    fn launch(
        manifest_path: &ManifestPath,
        db_url: DbUrl,
        temp_dir: Option<TempDir>,
        inference: InferenceBackend,
        extra_env: &[(String, String)],
    ) -> Result<Self, AnyError> {
        let (child, frame_port) = launch_server_process(manifest_path, &db_url, inference, extra_env)?;
        Ok(Self { child, frame_port, db_url, temp_dir })
    }

    #[cfg(feature = "postgres")]
    fn launch(
        manifest_path: &ManifestPath,
        db: PostgresTestDb,
        db_url: DbUrl,
        inference: InferenceBackend,
        extra_env: &[(String, String)],
    ) -> Result<Self, AnyError> {
        let (child, frame_port) = launch_server_process(manifest_path, &db_url, inference, extra_env)?;
        Ok(Self { child, frame_port, db_url, db, temp_dir: None })
    }

    /// The port the binary-frame TCP transport is bound to.
    pub const fn frame_port(&self) -> u16 { self.frame_port }

    /// The port the REST surface is bound to (`frame_port + 1`).
    pub const fn rest_port(&self) -> u16 { self.frame_port + 1 }

    /// The port the chunked UDP transport is bound to (`frame_port + 2`).
    pub const fn udp_port(&self) -> u16 { self.frame_port + 2 }

    /// The database URL the server was started against.
    pub fn db_url(&self) -> &DbUrl { &self.db_url }

    /// The temporary directory backing the `SQLite` file, if any.
    pub fn temp_dir(&self) -> Option<&TempDir> { self.temp_dir.as_ref() }

    /// Whether the database backing this server is an embedded `PostgreSQL`
    /// cluster rather than one supplied via `POSTGRES_TEST_URL`.
    #[cfg(feature = "postgres")]
    pub fn uses_embedded_postgres(&self) -> bool { self.db.uses_embedded() }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            let _ = kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM);
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
