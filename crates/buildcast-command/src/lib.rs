//! The `/circleci subscription` command for buildcast.
//!
//! [`Orchestrator`] turns one slash-command invocation into one
//! [`CommandResponse`]: it parses the subcommand, runs it against the
//! subscription repository, and renders the result. Identity lookup, the
//! selected project and the webhook URL come from collaborator traits in
//! [`context`]; chat transport is the caller's responsibility.

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod parse;
pub mod response;

pub use context::{
  CommandContext, IdentityResolver, ProjectContextProvider, ProjectRef,
  WebhookUrlProvider,
};
pub use error::IdentityError;
pub use orchestrator::Orchestrator;
pub use response::{Attachment, AttachmentField, CommandResponse};
