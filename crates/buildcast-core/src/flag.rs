//! Subscription flags: named modifiers that narrow which build events reach
//! a channel.
//!
//! The vocabulary is closed: [`Flag`] enumerates every known modifier, and
//! [`FlagSet::add_flag`] is the only place a user-supplied string is checked
//! against it.

use std::{
  collections::{BTreeMap, BTreeSet},
  fmt,
  str::FromStr,
};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

// ─── Flag ────────────────────────────────────────────────────────────────────

/// A known subscription modifier. The kebab-case spelling is used both in
/// commands (`--only-failed-builds`) and in the persisted snapshot.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Flag {
  /// Deliver only events for builds that failed.
  OnlyFailedBuilds,
}

impl Flag {
  pub fn name(self) -> &'static str { self.into() }

  /// One-line description used by the help text.
  pub fn description(self) -> &'static str {
    match self {
      Self::OnlyFailedBuilds => "Only receive notifications for failed builds",
    }
  }
}

impl fmt::Display for Flag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

// ─── FlagSet ─────────────────────────────────────────────────────────────────

/// The set of flags attached to one subscription.
///
/// Flags are set while a subscription is being built and never removed;
/// changing them means unsubscribing and subscribing again.
///
/// Serialised as a map of flag name to `true`, e.g.
/// `{"only-failed-builds": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
  try_from = "BTreeMap<String, bool>",
  into = "BTreeMap<String, bool>"
)]
pub struct FlagSet {
  flags: BTreeSet<Flag>,
}

impl FlagSet {
  /// Parse `name` against the vocabulary and mark it present.
  ///
  /// On failure the set is left untouched and the error carries the
  /// offending name.
  pub fn add_flag(&mut self, name: &str) -> Result<Flag> {
    let flag =
      Flag::from_str(name).map_err(|_| Error::UnknownFlag(name.to_owned()))?;
    self.flags.insert(flag);
    Ok(flag)
  }

  pub fn insert(&mut self, flag: Flag) { self.flags.insert(flag); }

  pub fn contains(&self, flag: Flag) -> bool { self.flags.contains(&flag) }

  pub fn is_empty(&self) -> bool { self.flags.is_empty() }

  /// Flags in vocabulary order.
  pub fn iter(&self) -> impl Iterator<Item = Flag> + '_ {
    self.flags.iter().copied()
  }
}

impl FromIterator<Flag> for FlagSet {
  fn from_iter<T: IntoIterator<Item = Flag>>(iter: T) -> Self {
    Self { flags: iter.into_iter().collect() }
  }
}

impl fmt::Display for FlagSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.flags.is_empty() {
      return f.write_str("none");
    }
    let names: Vec<&str> = self.iter().map(Flag::name).collect();
    f.write_str(&names.join(", "))
  }
}

impl TryFrom<BTreeMap<String, bool>> for FlagSet {
  type Error = Error;

  fn try_from(raw: BTreeMap<String, bool>) -> Result<Self> {
    let mut set = Self::default();
    for (name, present) in raw {
      if present {
        set.add_flag(&name)?;
      }
    }
    Ok(set)
  }
}

impl From<FlagSet> for BTreeMap<String, bool> {
  fn from(set: FlagSet) -> Self {
    set
      .iter()
      .map(|flag| (flag.name().to_owned(), true))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn known_flag_is_added_and_displayed() {
    let mut set = FlagSet::default();
    let flag = set.add_flag("only-failed-builds").unwrap();

    assert_eq!(flag, Flag::OnlyFailedBuilds);
    assert!(set.contains(Flag::OnlyFailedBuilds));
    assert_eq!(set.to_string(), "only-failed-builds");
  }

  #[test]
  fn unknown_flag_fails_and_leaves_set_unchanged() {
    let mut set = FlagSet::default();
    set.add_flag("only-failed-builds").unwrap();
    let before = set.clone();

    let err = set.add_flag("only-green-builds").unwrap_err();
    assert!(matches!(err, Error::UnknownFlag(ref name) if name == "only-green-builds"));
    assert_eq!(set, before);

    let mut empty = FlagSet::default();
    assert!(empty.add_flag("").is_err());
    assert!(empty.is_empty());
  }

  #[test]
  fn flag_names_are_case_sensitive() {
    let mut set = FlagSet::default();
    assert!(set.add_flag("Only-Failed-Builds").is_err());
    assert!(set.is_empty());
  }

  #[test]
  fn empty_set_displays_none() {
    assert_eq!(FlagSet::default().to_string(), "none");
  }

  #[test]
  fn adding_twice_is_idempotent() {
    let mut set = FlagSet::default();
    set.add_flag("only-failed-builds").unwrap();
    set.add_flag("only-failed-builds").unwrap();
    assert_eq!(set.iter().count(), 1);
  }

  #[test]
  fn every_flag_parses_from_its_own_name() {
    for flag in Flag::iter() {
      let mut set = FlagSet::default();
      assert_eq!(set.add_flag(flag.name()).unwrap(), flag);
      assert!(!flag.description().is_empty());
    }
  }

  #[test]
  fn serialises_as_name_to_bool_map() {
    let set: FlagSet = [Flag::OnlyFailedBuilds].into_iter().collect();
    let json = serde_json::to_string(&set).unwrap();
    assert_eq!(json, r#"{"only-failed-builds":true}"#);

    let back: FlagSet = serde_json::from_str(&json).unwrap();
    assert_eq!(back, set);
  }

  #[test]
  fn false_entries_are_ignored_and_unknown_names_rejected() {
    let set: FlagSet =
      serde_json::from_str(r#"{"only-failed-builds":false}"#).unwrap();
    assert!(set.is_empty());

    let err = serde_json::from_str::<FlagSet>(r#"{"bogus":true}"#);
    assert!(err.is_err());
  }
}
