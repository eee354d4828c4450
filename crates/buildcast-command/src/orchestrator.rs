//! [`Orchestrator`]: dispatches `/circleci subscription` subcommands.
//!
//! Every subcommand is a single leaf transition: parse, run one repository
//! transaction (or read), render one [`CommandResponse`]. Storage and
//! validation failures become user-facing text here and are never returned
//! as errors; the underlying cause only goes to the log.

use std::sync::Arc;

use buildcast_core::{
  flag::FlagSet,
  repository::{Change, SubscriptionRepository, TransactionError},
  store::SubscriptionStore,
  subscription::Subscription,
};

use crate::{
  context::{
    CommandContext, IdentityResolver, ProjectContextProvider, ProjectRef,
    WebhookUrlProvider,
  },
  parse::{
    ADD_TRIGGER, COMMAND_TRIGGER, HELP_TRIGGER, PROJECT_ARG, SUBSCRIBE_TRIGGER,
    Subcommand, SubcommandArgs, help_text,
  },
  response::{Attachment, AttachmentField, CommandResponse},
};

pub const INTERNAL_LOAD_ERROR: &str = "Internal error when getting subscriptions";
pub const INTERNAL_STORE_ERROR: &str = "Internal error when storing new subscription.";

/// Suffix of the line counting channels whose names could not be resolved.
pub const UNKNOWN_CHANNELS: &str = "unknown channel(s)";
pub const UNKNOWN_USER: &str = "Unknown user";

const ENV_VAR_DOCS_URL: &str =
  "https://circleci.com/docs/2.0/env-vars/#setting-an-environment-variable-in-a-project";

pub struct Orchestrator<S, I, P, W> {
  repository: Arc<SubscriptionRepository<S>>,
  identity:   I,
  projects:   P,
  webhook:    W,
}

impl<S, I, P, W> Orchestrator<S, I, P, W>
where
  S: SubscriptionStore,
  I: IdentityResolver,
  P: ProjectContextProvider,
  W: WebhookUrlProvider,
{
  pub fn new(
    repository: Arc<SubscriptionRepository<S>>,
    identity: I,
    projects: P,
    webhook: W,
  ) -> Self {
    Self { repository, identity, projects, webhook }
  }

  pub fn repository(&self) -> &Arc<SubscriptionRepository<S>> { &self.repository }

  /// Run the subcommand in `tokens` (everything after
  /// `/circleci subscription`) on behalf of `ctx`.
  pub async fn execute(&self, ctx: &CommandContext, tokens: &[&str]) -> CommandResponse {
    let subcommand = Subcommand::parse(tokens);
    tracing::debug!(
      channel_id = %ctx.channel_id,
      user_id = %ctx.user_id,
      ?subcommand,
      "executing subscription command"
    );

    match subcommand {
      Subcommand::Help => CommandResponse::text(help_text()),
      Subcommand::List => self.list(ctx).await,
      Subcommand::Add(args) => self.add(ctx, &args).await,
      Subcommand::Remove(args) => self.remove(ctx, &args).await,
      Subcommand::ListChannels(args) => self.list_channels(ctx, &args).await,
      Subcommand::Unknown(name) => CommandResponse::text(format!(
        "Unknown subcommand `{name}`.\n\n{}",
        help_text()
      )),
    }
  }

  // ── list ──────────────────────────────────────────────────────────────

  async fn list(&self, ctx: &CommandContext) -> CommandResponse {
    let subs = match self
      .repository
      .read(|subs| {
        subs
          .get_subscriptions_by_channel(&ctx.channel_id)
          .into_iter()
          .cloned()
          .collect::<Vec<Subscription>>()
      })
      .await
    {
      Ok(subs) => subs,
      Err(e) => return transaction_failed(e),
    };

    if subs.is_empty() {
      return CommandResponse::text(format!(
        "This channel is not subscribed to any repository. Try `/{COMMAND_TRIGGER} {SUBSCRIBE_TRIGGER} {ADD_TRIGGER}`"
      ));
    }

    let mut attachment = Attachment {
      title:    "Repositories this channel is subscribed to :".to_owned(),
      fallback: "List of repositories this channel is subscribed to".to_owned(),
      fields:   Vec::with_capacity(subs.len()),
    };

    for sub in &subs {
      let creator = match self.identity.resolve_user(sub.creator_id()).await {
        Ok(username) => format!("@{username}"),
        Err(e) => {
          tracing::error!(user_id = %sub.creator_id(), error = %e, "unable to get username");
          UNKNOWN_USER.to_owned()
        }
      };
      attachment.fields.push(subscription_field(sub, &creator));
    }

    CommandResponse::attachment(attachment)
  }

  // ── add ───────────────────────────────────────────────────────────────

  async fn add(&self, ctx: &CommandContext, args: &SubcommandArgs) -> CommandResponse {
    let project = match self.resolve_project(ctx, args) {
      Ok(project) => project,
      Err(response) => return response,
    };

    let mut flags = FlagSet::default();
    for name in &args.flags {
      if let Err(e) = flags.add_flag(name) {
        tracing::debug!(error = %e, "rejecting subscription");
        return CommandResponse::text(format!(
          "Unknown subscription flag `--{name}`. Try `/{COMMAND_TRIGGER} {SUBSCRIBE_TRIGGER} {HELP_TRIGGER}`"
        ));
      }
    }

    let sub = match Subscription::new(
      &ctx.channel_id,
      &project.owner,
      &project.repository,
      &ctx.user_id,
    ) {
      Ok(sub) => sub.with_flags(flags),
      Err(e) => {
        tracing::warn!(error = %e, "invalid subscription");
        return CommandResponse::text(format!("Unable to subscribe this channel: {e}"));
      }
    };
    let flags_display = sub.flags().to_string();

    tracing::debug!(subscription = ?sub, "adding a new subscription");
    let added = self
      .repository
      .update(move |subs| match subs.add_subscription(sub) {
        Ok(()) => Change::Commit(true),
        Err(e) => {
          tracing::debug!(error = %e, "subscription not added");
          Change::Abort(false)
        }
      })
      .await;

    match added {
      Ok(true) => CommandResponse::text(self.subscribed_message(&project, &flags_display)),
      Ok(false) => CommandResponse::text(format!(
        "This channel is already subscribed to {}. Remove the subscription first to change its flags.",
        project.to_markdown()
      )),
      Err(e) => transaction_failed(e),
    }
  }

  fn subscribed_message(&self, project: &ProjectRef, flags: &str) -> String {
    format!(
      "This channel has been subscribed to notifications from {} with flags: {flags}\n\
       #### How to finish setup:\n\
       1. Add a notification step to the project's CircleCI configuration that posts build results to the webhook below\n\
       2. Store the webhook URL as an environment variable of the project using the [CircleCI UI]({ENV_VAR_DOCS_URL})\n\
       **Webhook URL: `{}`**",
      project.to_markdown(),
      self.webhook.webhook_url(),
    )
  }

  // ── remove ────────────────────────────────────────────────────────────

  async fn remove(&self, ctx: &CommandContext, args: &SubcommandArgs) -> CommandResponse {
    let project = match self.resolve_project(ctx, args) {
      Ok(project) => project,
      Err(response) => return response,
    };

    let removed = self
      .repository
      .update(|subs| {
        if subs.remove_subscription(&ctx.channel_id, &project.owner, &project.repository) {
          Change::Commit(true)
        } else {
          Change::Abort(false)
        }
      })
      .await;

    match removed {
      Ok(true) => CommandResponse::text(format!(
        "Successfully unsubscribed this channel from {}",
        project.to_markdown()
      )),
      Ok(false) => CommandResponse::text(format!(
        "This channel was not subscribed to {}",
        project.to_markdown()
      )),
      Err(e) => transaction_failed(e),
    }
  }

  // ── list-channels ─────────────────────────────────────────────────────

  async fn list_channels(&self, ctx: &CommandContext, args: &SubcommandArgs) -> CommandResponse {
    let project = match self.resolve_project(ctx, args) {
      Ok(project) => project,
      Err(response) => return response,
    };

    let channel_ids = match self
      .repository
      .route_event(&project.owner, &project.repository)
      .await
    {
      Ok(ids) => ids,
      Err(e) => return transaction_failed(e),
    };

    if channel_ids.is_empty() {
      return CommandResponse::text(format!(
        "No channel is subscribed to the project {}. Try `/{COMMAND_TRIGGER} {SUBSCRIBE_TRIGGER} {ADD_TRIGGER}`",
        project.to_markdown()
      ));
    }

    let mut message = format!("Channels of this team subscribed to {}\n", project.to_markdown());
    let mut unresolved = 0;
    for channel_id in &channel_ids {
      match self.identity.resolve_channel(channel_id).await {
        Ok(name) => message.push_str(&format!("- ~{name}\n")),
        Err(e) => {
          tracing::error!(%channel_id, error = %e, "unable to get channel");
          unresolved += 1;
        }
      }
    }
    if unresolved > 0 {
      message.push_str(&format!("- {unresolved} {UNKNOWN_CHANNELS}\n"));
    }

    CommandResponse::text(message)
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  /// The `--project` override if given, else the channel's selected project.
  fn resolve_project(
    &self,
    ctx: &CommandContext,
    args: &SubcommandArgs,
  ) -> Result<ProjectRef, CommandResponse> {
    match args.project.as_deref() {
      Some(raw) => ProjectRef::parse(raw).ok_or_else(|| {
        CommandResponse::text(format!(
          "Invalid project `{raw}`. Expected `owner/repository`."
        ))
      }),
      None => self.projects.current_project(ctx).ok_or_else(|| {
        CommandResponse::text(format!(
          "No project is selected for this channel. Select one first, or pass `--{PROJECT_ARG} owner/repository`."
        ))
      }),
    }
  }
}

fn subscription_field(sub: &Subscription, creator: &str) -> AttachmentField {
  AttachmentField {
    title: sub.project(),
    value: format!("Subscribed by {creator}\nFlags: {}", sub.flags()),
    short: false,
  }
}

/// Log a failed load or store and hide the cause from the user.
fn transaction_failed<E: std::error::Error + 'static>(
  err: TransactionError<E>,
) -> CommandResponse {
  match err {
    TransactionError::Load(e) => {
      tracing::error!(error = %e, "unable to get subscriptions");
      CommandResponse::text(INTERNAL_LOAD_ERROR)
    }
    TransactionError::Store(e) => {
      tracing::error!(error = %e, "unable to store subscriptions");
      CommandResponse::text(INTERNAL_STORE_ERROR)
    }
  }
}
