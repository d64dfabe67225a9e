//! Mock server orchestration: mode dispatch, capture, and playback

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{Config, Mode};
use crate::matcher::{HttpRequest, Matcher};
use crate::record::{AssetNameRegistry, HttpResponse, RecordEntry, RecordStore};
use crate::storage::{self, SessionDocument};
use crate::transport::Transport;
use crate::{Result, TapedeckError};

/// The interception layer for one test session.
///
/// A caller-owned handle: construct with [`MockServer::initialize`], call
/// [`MockServer::start`] before serving, route every outbound request
/// through [`MockServer::handle`], and finish with
/// [`MockServer::dispose`], which persists the session in Record mode.
/// The mode is fixed for the life of the session.
pub struct MockServer {
    identity: String,
    mode: Mode,
    session_dir: PathBuf,
    purge_on_save: bool,
    matcher: Arc<dyn Matcher>,
    transport: Arc<dyn Transport>,
    store: RecordStore,
    names: AssetNameRegistry,
    log: Mutex<Vec<RecordEntry>>,
    started: AtomicBool,
}

impl MockServer {
    /// Create a session bound to `identity` with empty stores.
    ///
    /// The session directory is `<config.session_dir>/<identity>`; the
    /// identity must therefore be safe to use as a directory name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` if the identity fails validation
    pub fn initialize(
        config: &Config,
        matcher: Arc<dyn Matcher>,
        transport: Arc<dyn Transport>,
        identity: &str,
    ) -> Result<Self> {
        validate_identity(identity)?;

        let session_dir = config.session_dir.join(identity);

        info!(
            "Initialized session '{}' in {:?} mode",
            identity, config.mode
        );

        Ok(Self {
            identity: identity.to_string(),
            mode: config.mode,
            session_dir,
            purge_on_save: config.purge_on_save,
            matcher: Arc::clone(&matcher),
            transport,
            store: RecordStore::new(matcher),
            names: AssetNameRegistry::new(),
            log: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        })
    }

    /// Start serving. In Playback mode this loads the persisted session
    /// and bulk-populates the store and name registry before any request
    /// is handled. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the persisted session cannot be loaded
    pub fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if self.mode.is_playback() {
            let document = storage::load(&self.session_dir)?;
            info!(
                "Session '{}' playback: {} entries, {} name queues",
                self.identity,
                document.entries.len(),
                document.names.len()
            );
            self.store.load_all(document.entries);
            self.names.load_all(document.names);
        }

        Ok(())
    }

    /// Route one outbound request according to the session mode
    ///
    /// # Errors
    ///
    /// Returns `Uninitialized` before `start`, `Transport` on a live
    /// forward failure, `NoMatchingRecord` on playback divergence
    pub async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.ensure_started()?;

        match self.mode {
            Mode::None => self.handle_passthrough(request).await,
            Mode::Record => self.handle_record(request).await,
            Mode::Playback => self.handle_playback(&request),
        }
    }

    /// Forward unmodified; capture nothing
    async fn handle_passthrough(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("Passthrough: {} {}", request.method, request.uri);
        self.transport.send(&request).await
    }

    /// Forward, then capture the real pair into the store and the flat
    /// session log. The forward holds no lock; entries land in the log
    /// in the order their responses complete.
    async fn handle_record(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("Record: {} {}", request.method, request.uri);

        let response = self.transport.send(&request).await?;
        let entry = RecordEntry::capture(&request, &response);

        self.store.enqueue(entry.clone());
        self.log.lock().await.push(entry);

        Ok(response)
    }

    /// Serve from the store without touching the transport
    fn handle_playback(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let key = self.matcher.key(request);
        let entry = self.store.dequeue(&key)?;

        debug!(
            "Playback: {} {} -> {}",
            request.method, request.uri, entry.status_code
        );

        Ok(entry.response())
    }

    /// Get the next asset name for `test_name`.
    ///
    /// Playback replays the recorded queue; Record and None generate a
    /// fresh unique name and queue it for persistence.
    ///
    /// # Errors
    ///
    /// Returns `Uninitialized` before `start`, `NoRecordedName` on
    /// playback divergence
    pub fn get_asset_name(&self, test_name: &str, prefix: &str) -> Result<String> {
        self.ensure_started()?;

        if self.mode.is_playback() {
            self.names.dequeue(test_name)
        } else {
            Ok(self.names.generate_unique(test_name, prefix))
        }
    }

    /// Seed an extra entry directly into the store, bypassing the
    /// live-forward capture pipeline. Playback only; no-op otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Uninitialized` before `start`
    pub fn inject_record_entry(&self, entry: RecordEntry) -> Result<()> {
        self.ensure_started()?;

        if self.mode.is_playback() {
            self.store.enqueue(entry);
        } else {
            debug!("Injection ignored outside playback mode");
        }

        Ok(())
    }

    /// Tear the session down. Record mode persists the flat session log
    /// and the name registry first; a failed save is a hard error, since
    /// it would silently produce an empty replay session next run.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the Record-mode save fails
    pub fn dispose(self) -> Result<()> {
        if self.mode.is_record() && self.started.load(Ordering::SeqCst) {
            let entries = self.log.into_inner();
            let document = SessionDocument {
                version: storage::FORMAT_VERSION,
                entries,
                names: self.names.snapshot(),
            };

            let path = storage::save(&self.session_dir, &document, self.purge_on_save)?;
            info!(
                "Session '{}' persisted to {}",
                self.identity,
                path.display()
            );
        }

        Ok(())
    }

    /// The session's test identity
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The session's mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of entries currently queued in the store
    #[must_use]
    pub fn queued_entries(&self) -> usize {
        self.store.len()
    }

    fn ensure_started(&self) -> Result<()> {
        if self.started.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TapedeckError::Uninitialized)
        }
    }
}

/// Validate a test identity for use as a directory name
///
/// # Errors
///
/// Returns `InvalidIdentity` on an empty, oversized, or
/// filesystem-unsafe identity
fn validate_identity(identity: &str) -> Result<()> {
    if identity.is_empty() {
        return Err(TapedeckError::InvalidIdentity(
            "identity cannot be empty".to_string(),
        ));
    }

    if identity.len() > 255 {
        return Err(TapedeckError::InvalidIdentity(format!(
            "identity too long: {} > 255",
            identity.len()
        )));
    }

    if identity.contains('/') || identity.contains('\\') {
        return Err(TapedeckError::InvalidIdentity(
            "identity cannot contain path separators".to_string(),
        ));
    }

    if identity.starts_with('.') {
        return Err(TapedeckError::InvalidIdentity(
            "identity cannot start with dot".to_string(),
        ));
    }

    if identity.contains('\0') {
        return Err(TapedeckError::InvalidIdentity(
            "identity cannot contain null bytes".to_string(),
        ));
    }

    if identity.contains("..") {
        return Err(TapedeckError::InvalidIdentity(
            "identity cannot contain '..'".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::DefaultMatcher;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    /// Transport stub that serves scripted responses and counts calls
    struct ScriptedTransport {
        responses: Mutex<Vec<HttpResponse>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _request: &HttpRequest) -> Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().await;
            if responses.is_empty() {
                return Err(TapedeckError::Transport("script exhausted".to_string()));
            }
            Ok(responses.remove(0))
        }
    }

    fn config(mode: Mode, temp_dir: &TempDir) -> Config {
        Config {
            mode,
            session_dir: temp_dir.path().to_path_buf(),
            purge_on_save: true,
        }
    }

    fn request(uri: &str) -> HttpRequest {
        HttpRequest {
            method: "GET".to_string(),
            uri: uri.to_string(),
            headers: vec![],
            body: vec![],
        }
    }

    fn response(status: u16, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![],
            body: body.to_vec(),
        }
    }

    fn server(mode: Mode, temp_dir: &TempDir, responses: Vec<HttpResponse>) -> MockServer {
        MockServer::initialize(
            &config(mode, temp_dir),
            Arc::new(DefaultMatcher),
            Arc::new(ScriptedTransport::new(responses)),
            "test_identity",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_handle_before_start_fails() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(Mode::Record, &temp_dir, vec![]);

        let result = server.handle(request("/db/foo")).await;
        assert!(matches!(result, Err(TapedeckError::Uninitialized)));
    }

    #[tokio::test]
    async fn test_get_asset_name_before_start_fails() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(Mode::Record, &temp_dir, vec![]);

        assert!(matches!(
            server.get_asset_name("T", "rg-"),
            Err(TapedeckError::Uninitialized)
        ));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(Mode::Playback, &temp_dir, vec![]);

        server.start().unwrap();
        server.start().unwrap();
    }

    #[tokio::test]
    async fn test_record_captures_and_returns_live_response() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(Mode::Record, &temp_dir, vec![response(201, b"created")]);
        server.start().unwrap();

        let resp = server.handle(request("/db/foo")).await.unwrap();

        assert_eq!(resp.status, 201);
        assert_eq!(resp.body, b"created");
        assert_eq!(server.queued_entries(), 1);
    }

    #[tokio::test]
    async fn test_record_transport_failure_captures_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(Mode::Record, &temp_dir, vec![]);
        server.start().unwrap();

        let result = server.handle(request("/db/foo")).await;

        assert!(matches!(result, Err(TapedeckError::Transport(_))));
        assert_eq!(server.queued_entries(), 0);
    }

    #[tokio::test]
    async fn test_playback_serves_injected_entry_without_transport() {
        let temp_dir = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new(vec![response(200, b"live")]));
        let server = MockServer::initialize(
            &config(Mode::Playback, &temp_dir),
            Arc::new(DefaultMatcher),
            Arc::clone(&transport) as Arc<dyn Transport>,
            "test_identity",
        )
        .unwrap();
        server.start().unwrap();

        let entry = RecordEntry::capture(&request("/db/foo"), &response(203, b"seeded"));
        server.inject_record_entry(entry).unwrap();

        let resp = server.handle(request("/db/foo")).await.unwrap();

        assert_eq!(resp.status, 203);
        assert_eq!(resp.body, b"seeded");
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_playback_divergence_fails_loudly() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(Mode::Playback, &temp_dir, vec![]);
        server.start().unwrap();

        let result = server.handle(request("/db/foo")).await;

        assert!(matches!(result, Err(TapedeckError::NoMatchingRecord(_))));
    }

    #[tokio::test]
    async fn test_injection_is_noop_outside_playback() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(Mode::Record, &temp_dir, vec![]);
        server.start().unwrap();

        let entry = RecordEntry::capture(&request("/db/foo"), &response(200, b""));
        server.inject_record_entry(entry).unwrap();

        assert_eq!(server.queued_entries(), 0);
    }

    #[tokio::test]
    async fn test_passthrough_forwards_without_capture() {
        let temp_dir = TempDir::new().unwrap();
        let transport = Arc::new(ScriptedTransport::new(vec![response(200, b"live")]));
        let server = MockServer::initialize(
            &config(Mode::None, &temp_dir),
            Arc::new(DefaultMatcher),
            Arc::clone(&transport) as Arc<dyn Transport>,
            "test_identity",
        )
        .unwrap();
        server.start().unwrap();

        let resp = server.handle(request("/db/foo")).await.unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(server.queued_entries(), 0);
    }

    #[tokio::test]
    async fn test_none_mode_dispose_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let server = server(Mode::None, &temp_dir, vec![response(200, b"")]);
        server.start().unwrap();

        server.handle(request("/db/foo")).await.unwrap();
        server.dispose().unwrap();

        let identity_dir = temp_dir.path().join("test_identity");
        assert!(!identity_dir.exists());
    }

    #[tokio::test]
    async fn test_record_mode_dispose_persists() {
        let temp_dir = TempDir::new().unwrap();

        let server = server(Mode::Record, &temp_dir, vec![response(200, b"ok")]);
        server.start().unwrap();
        server.handle(request("/db/foo")).await.unwrap();
        server.get_asset_name("T", "rg-").unwrap();
        server.dispose().unwrap();

        let document = storage::load(&temp_dir.path().join("test_identity")).unwrap();
        assert_eq!(document.entries.len(), 1);
        assert_eq!(document.names["T"].len(), 1);
    }

    #[tokio::test]
    async fn test_asset_name_generated_in_record_and_none() {
        let temp_dir = TempDir::new().unwrap();

        for mode in [Mode::Record, Mode::None] {
            let server = server(mode, &temp_dir, vec![]);
            server.start().unwrap();

            let name = server.get_asset_name("T", "rg-").unwrap();
            assert!(name.starts_with("rg-"));
        }
    }

    #[test]
    fn test_validate_identity() {
        assert!(validate_identity("valid_test").is_ok());
        assert!(validate_identity("Namespace.Class.method").is_ok());

        assert!(validate_identity("").is_err());
        assert!(validate_identity(".hidden").is_err());
        assert!(validate_identity("a/b").is_err());
        assert!(validate_identity("a\\b").is_err());
        assert!(validate_identity("a..b").is_err());
        assert!(validate_identity("a\0b").is_err());
        assert!(validate_identity(&"x".repeat(256)).is_err());
    }
}
