//! Request parsing and validation.
//!
//! Frames are parsed as untyped JSON first and then narrowed field by field
//! into [`Message`], so dispatch only ever sees well-formed requests. A value
//! that is not an object simply has no fields.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::transport::RawFrame;

use super::errors::ValidationError;

const HEALTH: &str = "health";
const CONTEXT: &str = "context";
const PROMPT: &str = "prompt";
const FENCE: &str = "```";

/// Request fields as sent by clients.
struct WireMessage<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> WireMessage<'a> {
    fn new(value: &'a Value) -> Self {
        Self {
            fields: value.as_object(),
        }
    }

    fn field(&self, name: &str) -> Option<&'a Value> {
        self.fields.and_then(|fields| fields.get(name))
    }

    /// Reads a string field. Null and empty strings count as absent; any
    /// other non-string value is malformed.
    fn string(&self, name: &str) -> Result<Option<String>, ValidationError> {
        let Some(value) = self.field(name) else {
            return Ok(None);
        };
        let text = Option::<String>::deserialize(value).map_err(ValidationError::malformed)?;
        Ok(non_empty(text))
    }

    /// Raw `type` value: strings verbatim, other values as their JSON text.
    fn kind(&self) -> Option<String> {
        match self.field("type")? {
            Value::Null => None,
            Value::String(kind) => Some(kind.clone()),
            other => Some(other.to_string()),
        }
    }

    fn is_health(&self) -> bool {
        self.field("type").and_then(Value::as_str) == Some(HEALTH)
    }

    fn into_message(self) -> Result<Message, ValidationError> {
        if self.is_health() {
            return Ok(Message::Health);
        }

        let text = self.string("text")?.ok_or(ValidationError::MissingText)?;
        let snippet = Snippet {
            text,
            file: self.string("file")?,
            filetype: self.string("filetype")?,
        };

        let kind = self.kind();
        Ok(match kind.as_deref() {
            Some(CONTEXT) => Message::Context(snippet),
            Some(PROMPT) => Message::Prompt {
                instruction: self.string(PROMPT)?,
                snippet,
            },
            _ => Message::Unknown { kind: kind.clone() },
        })
    }
}

/// Validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Liveness probe.
    Health,
    /// Content delivered at the start of the host's next turn.
    Context(Snippet),
    /// Content queued as a follow-up user message.
    Prompt {
        /// Instruction placed before the snippet.
        instruction: Option<String>,
        /// Snippet the instruction refers to.
        snippet: Snippet,
    },
    /// Request with text whose kind is not recognised.
    Unknown {
        /// Raw `type` value, absent when the field was omitted or null.
        kind: Option<String>,
    },
}

impl Message {
    /// Parses and validates one request line.
    ///
    /// A `health` request is valid whatever its other fields hold. Every
    /// other request needs a non-empty string `text`; its kind is only
    /// examined after that.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedPayload`] when the bytes are not
    /// JSON or a snippet field holds something other than a string, and
    /// [`ValidationError::MissingText`] when a non-health request has no
    /// text.
    pub fn parse(bytes: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(bytes).map_err(ValidationError::malformed)?;
        WireMessage::new(&value).into_message()
    }

    /// Request kind for logging.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Health => HEALTH,
            Self::Context(_) => CONTEXT,
            Self::Prompt { .. } => PROMPT,
            Self::Unknown { kind } => kind.as_deref().unwrap_or_default(),
        }
    }
}

/// Validates one frame.
///
/// # Errors
///
/// See [`Message::parse`].
pub fn validate(frame: &RawFrame) -> Result<Message, ValidationError> {
    Message::parse(frame.as_bytes())
}

/// Editor text with its optional origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    text: String,
    file: Option<String>,
    filetype: Option<String>,
}

impl Snippet {
    /// Builds a snippet; empty optional labels are treated as absent.
    #[must_use]
    pub fn new(text: impl Into<String>, file: Option<String>, filetype: Option<String>) -> Self {
        Self {
            text: text.into(),
            file: non_empty(file),
            filetype: non_empty(filetype),
        }
    }

    /// Snippet body.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Originating file label.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Language tag used for the fence.
    #[must_use]
    pub fn filetype(&self) -> Option<&str> {
        self.filetype.as_deref()
    }

    /// Number of newline-separated segments in the text.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Renders the display block: an optional `File:` header followed by the
    /// text in a fenced block tagged with the filetype.
    #[must_use]
    pub fn render(&self) -> String {
        let mut block = String::with_capacity(self.text.len() + 32);
        if let Some(file) = &self.file {
            block.push_str("File: ");
            block.push_str(file);
            if let Some(filetype) = &self.filetype {
                block.push_str(" (");
                block.push_str(filetype);
                block.push(')');
            }
            block.push('\n');
        }
        block.push_str(FENCE);
        block.push_str(self.filetype.as_deref().unwrap_or_default());
        block.push('\n');
        block.push_str(&self.text);
        if !self.text.ends_with('\n') {
            block.push('\n');
        }
        block.push_str(FENCE);
        block
    }

    /// Renders the display block preceded by `instruction` and a blank line.
    #[must_use]
    pub fn render_with_instruction(&self, instruction: Option<&str>) -> String {
        match instruction.filter(|text| !text.is_empty()) {
            Some(instruction) => format!("{instruction}\n\n{}", self.render()),
            None => self.render(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}
