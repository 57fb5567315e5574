//! # Common Test Utilities
//!
//! `TestApp` spawns the real server on a random port with a temporary database
//! and upload directory. Chat and embedding calls go to an `httpmock` server.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use httpmock::MockServer;
use medibot_server::{
    config, router,
    state::{build_app_state, AppState},
};
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use std::{
    fs::File,
    io::Write,
    net::SocketAddr,
    path::{Path, PathBuf},
};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

/// Knobs for the generated `config.yml`.
#[derive(Debug, Clone, Copy)]
pub struct TestOptions {
    pub indexing: bool,
    pub max_upload_bytes: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            indexing: false,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub upload_dir: PathBuf,
    pub app_state: AppState,
    _dir: Option<TempDir>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_options(TestOptions::default()).await
    }

    /// Writes a config file pointing at temp storage and the mock server, then
    /// builds the state from it exactly as the binary does.
    pub async fn spawn_with_options(options: TestOptions) -> Result<Self> {
        let mock_server = MockServer::start();
        let (app_state, dir) = build_test_state(&mock_server, options).await?;

        let mut app = TestApp::spawn_with_state(app_state, mock_server).await?;
        app._dir = Some(dir);
        Ok(app)
    }

    pub async fn spawn_with_state(app_state: AppState, mock_server: MockServer) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let upload_dir = PathBuf::from(&app_state.config.upload_dir);
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            upload_dir,
            app_state: app_state_for_harness,
            _dir: None,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Posts a multipart upload with the given file part and text fields.
    pub async fn upload(
        &self,
        file: Option<(&str, &str, Vec<u8>)>,
        fields: &[(&str, &str)],
    ) -> Result<Response> {
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        if let Some((file_name, mime, bytes)) = file {
            let part = Part::bytes(bytes)
                .file_name(file_name.to_string())
                .mime_str(mime)?;
            form = form.part("prescription", part);
        }

        Ok(self
            .client
            .post(format!("{}/medical/upload-prescription", self.address))
            .multipart(form)
            .send()
            .await?)
    }

    /// Names of the files currently in the upload directory.
    pub fn uploaded_files(&self) -> Vec<String> {
        list_files(&self.upload_dir)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Builds an `AppState` backed by a fresh temp directory.
pub async fn build_test_state(
    mock_server: &MockServer,
    options: TestOptions,
) -> Result<(AppState, TempDir)> {
    let dir = tempdir()?;
    let db_path = dir.path().join("medibot.db");
    let upload_dir = dir.path().join("uploads");
    let config_path = dir.path().join("config.yml");

    let config_content = format!(
        r#"
port: 0
db_url: "{}"
upload_dir: "{}"
request_timeout_secs: 5
server:
  max_upload_bytes: {}
embedding:
  api_url: "{}"
  model_name: "mock-embedding-model"
indexing:
  enabled: {}
  chunk_size: 500
  chunk_overlap: 50
providers:
  groq_default:
    provider: "local"
    api_url: "{}"
    api_key: null
    model_name: "mock-chat-model"
    temperature: 0.3
"#,
        db_path.display(),
        upload_dir.display(),
        options.max_upload_bytes,
        mock_server.url("/api/embed"),
        options.indexing,
        mock_server.url("/v1/chat/completions"),
    );
    let mut file = File::create(&config_path)?;
    file.write_all(config_content.as_bytes())?;

    let config = config::get_config(Some(config_path.to_string_lossy().as_ref()))?;
    let app_state = build_app_state(config).await?;
    Ok((app_state, dir))
}

pub fn list_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
