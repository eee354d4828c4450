//! Response types handed to the chat presentation layer.

use serde::Serialize;

/// One field of an [`Attachment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentField {
  pub title: String,
  pub value: String,
  pub short: bool,
}

/// A structured message block, rendered by the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attachment {
  pub title:    String,
  /// Plain-text summary for clients that cannot render attachments.
  pub fallback: String,
  pub fields:   Vec<AttachmentField>,
}

/// The reply to one command invocation, shown only to the invoking user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
  pub text:        String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub attachments: Vec<Attachment>,
}

impl CommandResponse {
  pub fn text(text: impl Into<String>) -> Self {
    Self { text: text.into(), attachments: Vec::new() }
  }

  pub fn attachment(attachment: Attachment) -> Self {
    Self { text: String::new(), attachments: vec![attachment] }
  }
}
