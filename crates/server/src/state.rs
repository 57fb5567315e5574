//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds the configuration, the
//! prescription store, the instantiated AI and embedding clients, and the
//! per-user index registry, making them accessible to all request handlers.

use crate::config::{AppConfig, CONVERSATION_SUMMARY_TASK};
use anyhow::{anyhow, Context};
use medibot::{
    ingest::{ChunkingPolicy, IndexRegistry},
    providers::{
        ai::{AiProvider, EmbeddingProvider},
        db::{PrescriptionStore, SqliteProvider},
        factory::{build_ai_provider, build_embedding_provider},
    },
};
use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};
use tracing::info;

/// A fully resolved task configuration with non-optional fields.
#[derive(Clone, Debug)]
pub struct ResolvedTask {
    pub provider: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// A map of fully resolved tasks, ready for use by handlers.
    pub tasks: Arc<HashMap<String, ResolvedTask>>,
    /// Where prescription records are persisted.
    pub store: Arc<dyn PrescriptionStore>,
    /// A map of instantiated AI providers, keyed by their name from the config.
    pub ai_providers: Arc<HashMap<String, Box<dyn AiProvider>>>,
    /// Present only when indexing is enabled.
    pub embedder: Option<Arc<dyn EmbeddingProvider>>,
    pub chunking: ChunkingPolicy,
    pub indexes: IndexRegistry,
}

impl AppState {
    /// Looks up a task and the provider it is bound to.
    pub fn task(&self, name: &str) -> anyhow::Result<(&ResolvedTask, &dyn AiProvider)> {
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| anyhow!("Configuration for task '{name}' not found."))?;
        let provider = self
            .ai_providers
            .get(&task.provider)
            .ok_or_else(|| anyhow!("Provider '{}' not found in providers map.", task.provider))?;
        Ok((task, provider.as_ref()))
    }
}

fn resolve_tasks(config: &AppConfig) -> anyhow::Result<HashMap<String, ResolvedTask>> {
    let mut resolved_tasks = HashMap::new();
    for (name, task_config) in &config.tasks {
        let provider = task_config.provider.clone().ok_or_else(|| {
            anyhow!("Resolved task '{name}' is missing required 'provider' field")
        })?;
        if !config.providers.contains_key(&provider) {
            return Err(anyhow!(
                "Task '{name}' refers to unknown provider '{provider}'"
            ));
        }
        let system_prompt = task_config.system_prompt.clone().ok_or_else(|| {
            anyhow!("Resolved task '{name}' is missing required 'system_prompt' field")
        })?;
        let user_prompt = task_config.user_prompt.clone().ok_or_else(|| {
            anyhow!("Resolved task '{name}' is missing required 'user_prompt' field")
        })?;

        resolved_tasks.insert(
            name.clone(),
            ResolvedTask {
                provider,
                system_prompt,
                user_prompt,
            },
        );
    }

    if !resolved_tasks.contains_key(CONVERSATION_SUMMARY_TASK) {
        return Err(anyhow!("Task '{CONVERSATION_SUMMARY_TASK}' is not configured"));
    }
    Ok(resolved_tasks)
}

/// Builds the shared application state from the configuration.
///
/// Opens (and migrates) the SQLite database, creates the upload directory,
/// instantiates one chat client per configured provider and, when indexing is
/// enabled, the embedding client.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let timeout = Some(Duration::from_secs(config.request_timeout_secs));

    let mut ai_providers = HashMap::new();
    for (name, provider_config) in &config.providers {
        let provider = build_ai_provider(name, provider_config, timeout)?;
        ai_providers.insert(name.clone(), provider);
    }

    let tasks = resolve_tasks(&config)?;

    let chunking = ChunkingPolicy::new(config.indexing.chunk_size, config.indexing.chunk_overlap)
        .context("Invalid indexing configuration")?;
    let embedder: Option<Arc<dyn EmbeddingProvider>> = if config.indexing.enabled {
        Some(Arc::from(build_embedding_provider(&config.embedding, timeout)?))
    } else {
        info!("Prescription indexing is disabled.");
        None
    };

    if config.db_url != ":memory:" {
        if let Some(parent) = Path::new(&config.db_url).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create database directory {parent:?}"))?;
            }
        }
    }
    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    sqlite_provider.initialize_schema().await?;
    info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory '{}'", config.upload_dir))?;

    Ok(AppState {
        config: Arc::new(config),
        tasks: Arc::new(tasks),
        store: Arc::new(sqlite_provider),
        ai_providers: Arc::new(ai_providers),
        embedder,
        chunking,
        indexes: IndexRegistry::new(),
    })
}
