//! Subcommand and argument parsing for `/circleci subscription`.

use buildcast_core::flag::Flag;
use strum::IntoEnumIterator as _;

pub const COMMAND_TRIGGER: &str = "circleci";
pub const SUBSCRIBE_TRIGGER: &str = "subscription";

pub const HELP_TRIGGER: &str = "help";
pub const LIST_TRIGGER: &str = "list";
pub const ADD_TRIGGER: &str = "add";
pub const REMOVE_TRIGGER: &str = "remove";
pub const LIST_CHANNELS_TRIGGER: &str = "list-channels";

/// Named argument overriding the channel's selected project.
pub const PROJECT_ARG: &str = "project";

// ─── Arguments ───────────────────────────────────────────────────────────────

/// Named arguments following a subcommand.
///
/// `--project owner/repo` (or `--project=owner/repo`) is pulled out; every
/// other `--name` token is kept as a flag name for later validation. Bare
/// tokens are ignored, so `--only-failed-builds true` reads the same as
/// `--only-failed-builds`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubcommandArgs {
  /// Raw project override. `Some("")` when `--project` had no value.
  pub project: Option<String>,
  /// Flag names without the leading `--`, in the order given.
  pub flags:   Vec<String>,
}

impl SubcommandArgs {
  pub fn parse(tokens: &[&str]) -> Self {
    let mut args = Self::default();
    let mut tokens = tokens.iter();

    while let Some(&token) = tokens.next() {
      let Some(name) = token.strip_prefix("--") else {
        continue;
      };
      if let Some(value) = name.strip_prefix("project=") {
        args.project = Some(value.to_owned());
      } else if name == PROJECT_ARG {
        args.project = Some(tokens.next().map(|v| (*v).to_owned()).unwrap_or_default());
      } else {
        args.flags.push(name.to_owned());
      }
    }

    args
  }
}

// ─── Subcommand ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subcommand {
  Help,
  List,
  Add(SubcommandArgs),
  Remove(SubcommandArgs),
  ListChannels(SubcommandArgs),
  Unknown(String),
}

impl Subcommand {
  /// Parse the tokens following `/circleci subscription`. No tokens means
  /// help.
  pub fn parse(tokens: &[&str]) -> Self {
    let Some((&name, rest)) = tokens.split_first() else {
      return Self::Help;
    };
    match name {
      HELP_TRIGGER => Self::Help,
      LIST_TRIGGER => Self::List,
      ADD_TRIGGER => Self::Add(SubcommandArgs::parse(rest)),
      REMOVE_TRIGGER => Self::Remove(SubcommandArgs::parse(rest)),
      LIST_CHANNELS_TRIGGER => Self::ListChannels(SubcommandArgs::parse(rest)),
      other => Self::Unknown(other.to_owned()),
    }
  }
}

/// Strip an optional leading `/circleci` and `subscription` from a full
/// command line and split the rest on whitespace.
pub fn command_tokens(line: &str) -> Vec<&str> {
  let mut tokens: Vec<&str> = line.split_whitespace().collect();
  if tokens
    .first()
    .is_some_and(|t| t.trim_start_matches('/') == COMMAND_TRIGGER)
  {
    tokens.remove(0);
  }
  if tokens.first() == Some(&SUBSCRIBE_TRIGGER) {
    tokens.remove(0);
  }
  tokens
}

/// Usage text listing every subcommand and the `add` flags.
pub fn help_text() -> String {
  let prefix = format!("/{COMMAND_TRIGGER} {SUBSCRIBE_TRIGGER}");
  let mut text = String::from("#### Manage your subscriptions\n");

  for (trigger, hint, help) in [
    (LIST_TRIGGER, "", "List the CircleCI subscriptions for the current channel"),
    (
      ADD_TRIGGER,
      " [--flags]",
      "Subscribe the current channel to CircleCI notifications for a project",
    ),
    (
      REMOVE_TRIGGER,
      "",
      "Unsubscribe the current channel from CircleCI notifications for a project",
    ),
    (
      LIST_CHANNELS_TRIGGER,
      "",
      "List all channels in the current team subscribed to a project",
    ),
  ] {
    text.push_str(&format!("- `{prefix} {trigger}{hint}`: {help}\n"));
  }

  text.push_str("\nFlags for `add`:\n");
  for flag in Flag::iter() {
    text.push_str(&format!("- `--{}`: {}\n", flag.name(), flag.description()));
  }
  text.push_str(&format!(
    "\n`add`, `remove` and `{LIST_CHANNELS_TRIGGER}` accept `--{PROJECT_ARG} owner/repository` \
     to use a project other than the one selected for this channel.\n"
  ));
  text
}
