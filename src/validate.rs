//! Request bodies and the checks applied to them before anything touches the store.

use serde::Deserialize;

use crate::{AppError, AppResult, config::RoomSettings, messages::MessageKind};

/// Removes markup and surrounding whitespace from user supplied text.
///
/// A `<` only opens a tag when followed by a letter, `/` or `!` and closed by a
/// later `>`; any other `<` is kept as typed.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let opens_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');

        match after.find('>') {
            Some(close) if opens_tag => rest = &after[close + 1..],
            _ => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    out.trim().to_owned()
}

#[derive(Debug, Deserialize)]
pub struct ParticipantBody {
    pub name: String,
}

impl ParticipantBody {
    /// Returns the sanitized name a participant may join with.
    pub fn validate(self, room: &RoomSettings) -> AppResult<String> {
        let name = sanitize(&self.name);
        if name.is_empty() {
            return Err(AppError::invalid("name must not be empty"));
        }
        if name == room.broadcast_target {
            return Err(AppError::invalid(format!("{name} is reserved")));
        }
        Ok(name)
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A validated message, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

impl MessageBody {
    pub fn validate(self) -> AppResult<MessageDraft> {
        let to = sanitize(&self.to);
        if to.is_empty() {
            return Err(AppError::invalid("to must not be empty"));
        }

        let text = sanitize(&self.text);
        if text.is_empty() {
            return Err(AppError::invalid("text must not be empty"));
        }

        // status entries are only ever written by the server
        let kind = match self.kind.trim().parse::<MessageKind>()? {
            MessageKind::Status => {
                return Err(AppError::invalid("type must be message or private_message"));
            }
            kind => kind,
        };

        Ok(MessageDraft { to, text, kind })
    }
}
