//! HTTP surface for buildcast.
//!
//! Exposes an axum [`Router`] with two routes:
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/command` | Body: [`CommandRequest`]; returns a [`CommandResponse`] |
//! | `GET`  | `/routes/{owner}/{repository}` | Optional `?status=success\|failed\|other`; returns channel IDs |
//!
//! Chat-platform signature checks and TLS are the caller's responsibility.

pub mod directory;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  routing::{get, post},
};
use buildcast_command::{CommandContext, CommandResponse, Orchestrator, parse::command_tokens};
use buildcast_core::{
  event::{BuildEvent, BuildStatus},
  repository::SubscriptionRepository,
  store::SubscriptionStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use directory::{ChannelProjects, Directory, WebhookUrl};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  /// Public base URL, used to build the webhook URL.
  pub base_url:     String,
  /// SQLite file; `:memory:` keeps everything in memory.
  pub store_path:   PathBuf,
  #[serde(default = "default_webhook_path")]
  pub webhook_path: String,
  #[serde(default)]
  pub users:        Vec<UserEntry>,
  #[serde(default)]
  pub channels:     Vec<ChannelEntry>,
}

fn default_webhook_path() -> String { "/hooks/circleci".to_owned() }

/// A user known to the directory.
#[derive(Deserialize, Clone, Debug)]
pub struct UserEntry {
  pub id:   String,
  pub name: String,
}

/// A channel known to the directory, with its selected project if any.
#[derive(Deserialize, Clone, Debug)]
pub struct ChannelEntry {
  pub id:      String,
  pub name:    String,
  /// `owner/repository`.
  #[serde(default)]
  pub project: Option<String>,
}

// ─── Application state ────────────────────────────────────────────────────────

pub type ServerOrchestrator<S> = Orchestrator<S, Directory, ChannelProjects, WebhookUrl>;

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub orchestrator: Arc<ServerOrchestrator<S>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self { Self { orchestrator: Arc::clone(&self.orchestrator) } }
}

impl<S: SubscriptionStore> AppState<S> {
  /// Wire `store` and the config-backed collaborators together.
  pub fn from_config(store: S, config: &ServerConfig) -> Self {
    let orchestrator = Orchestrator::new(
      Arc::new(SubscriptionRepository::new(store)),
      Directory::new(&config.users, &config.channels),
      ChannelProjects::new(&config.channels),
      WebhookUrl::new(&config.base_url, &config.webhook_path),
    );
    Self { orchestrator: Arc::new(orchestrator) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SubscriptionStore + 'static,
{
  Router::new()
    .route("/command", post(command::<S>))
    .route("/routes/{owner}/{repository}", get(routes::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// A slash-command invocation as forwarded by the chat platform.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
  pub channel_id: String,
  pub user_id:    String,
  /// Full command line, e.g. `/circleci subscription add --only-failed-builds`.
  pub command:    String,
}

/// `POST /command`: always 200; failures are in the response text.
async fn command<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CommandRequest>,
) -> Json<CommandResponse>
where
  S: SubscriptionStore + 'static,
{
  let tokens = command_tokens(&body.command);
  let ctx = CommandContext::new(body.channel_id.as_str(), body.user_id.as_str());
  Json(state.orchestrator.execute(&ctx, &tokens).await)
}

#[derive(Debug, Deserialize)]
pub struct RouteParams {
  /// When present, subscription flags are applied to an event with this
  /// status.
  pub status: Option<BuildStatus>,
}

/// `GET /routes/{owner}/{repository}[?status=<status>]`
async fn routes<S>(
  State(state): State<AppState<S>>,
  Path((owner, repository)): Path<(String, String)>,
  Query(params): Query<RouteParams>,
) -> Result<Json<Vec<String>>, Error>
where
  S: SubscriptionStore + 'static,
{
  let repo = state.orchestrator.repository();
  let channels = match params.status {
    Some(status) => {
      repo
        .route_build_event(&BuildEvent::new(owner, repository, status))
        .await
    }
    None => repo.route_event(&owner, &repository).await,
  }
  .map_err(|e| Error::Store(Box::new(e)))?;

  Ok(Json(channels))
}
