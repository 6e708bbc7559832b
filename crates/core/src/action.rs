//! The closed primitive-action protocol.
//!
//! Actions arrive from the generator as JSON objects carrying a string `type`
//! discriminator. The protocol is deliberately closed: both the decoder here
//! and the executor in the runtime match exhaustively, and any unrecognized
//! discriminator lands in an explicit default case. Retired kinds from earlier
//! protocol generations (`ADD_STATE`, `SUBTRACT_STATE`, `READ_STATE`,
//! `ROLL_DICE`) are rejected through the same path, never silently ignored.
//! Unrecognized *extra fields* on a known action are tolerated.

use serde_json::Value;
use thiserror::Error;

/// One atomic, typed instruction proposed by the generator.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Narrate {
        text: String,
        sound_effect: Option<String>,
    },
    SetState {
        path: String,
        value: Value,
    },
    PlayerRolled {
        value: f64,
    },
    PlayerAnswered {
        answer: String,
    },
    ResetGame {
        keep_player_names: bool,
    },
}

/// Structural decoding failures for a single wire action.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("action is not an object")]
    NotAnObject,

    #[error("action 'type' discriminator is missing or not a string")]
    MissingDiscriminator,

    #[error("invalid action type '{0}'")]
    InvalidType(String),

    #[error("{kind} action is missing required field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("{kind} action field '{field}' has the wrong type")]
    WrongFieldType {
        kind: &'static str,
        field: &'static str,
    },
}

impl Action {
    /// Decodes one wire action, checking shape and field types only.
    /// Semantic policy (positive rolls, non-empty answers) belongs to the
    /// validator, not the decoder.
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let object = raw.as_object().ok_or(DecodeError::NotAnObject)?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingDiscriminator)?;

        match kind {
            "NARRATE" => {
                let text = require_str(object, "NARRATE", "text")?;
                let sound_effect = match object.get("soundEffect") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(effect)) => Some(effect.clone()),
                    Some(_) => {
                        return Err(DecodeError::WrongFieldType {
                            kind: "NARRATE",
                            field: "soundEffect",
                        });
                    }
                };
                Ok(Self::Narrate { text, sound_effect })
            }
            "SET_STATE" => {
                let path = require_str(object, "SET_STATE", "path")?;
                let value = object
                    .get("value")
                    .cloned()
                    .ok_or(DecodeError::MissingField {
                        kind: "SET_STATE",
                        field: "value",
                    })?;
                Ok(Self::SetState { path, value })
            }
            "PLAYER_ROLLED" => {
                let value = match object.get("value") {
                    None => {
                        return Err(DecodeError::MissingField {
                            kind: "PLAYER_ROLLED",
                            field: "value",
                        });
                    }
                    Some(raw) => raw.as_f64().ok_or(DecodeError::WrongFieldType {
                        kind: "PLAYER_ROLLED",
                        field: "value",
                    })?,
                };
                Ok(Self::PlayerRolled { value })
            }
            "PLAYER_ANSWERED" => {
                let answer = require_str(object, "PLAYER_ANSWERED", "answer")?;
                Ok(Self::PlayerAnswered { answer })
            }
            "RESET_GAME" => {
                // A missing flag decodes as false, mirroring the wire's
                // optional-boolean convention.
                let keep_player_names = match object.get("keepPlayerNames") {
                    None | Some(Value::Null) => false,
                    Some(Value::Bool(keep)) => *keep,
                    Some(_) => {
                        return Err(DecodeError::WrongFieldType {
                            kind: "RESET_GAME",
                            field: "keepPlayerNames",
                        });
                    }
                };
                Ok(Self::ResetGame { keep_player_names })
            }
            // Retired generations (ADD_STATE, SUBTRACT_STATE, READ_STATE,
            // ROLL_DICE) fall through here on purpose.
            other => Err(DecodeError::InvalidType(other.to_string())),
        }
    }

    /// Wire discriminator for this action, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Narrate { .. } => "NARRATE",
            Self::SetState { .. } => "SET_STATE",
            Self::PlayerRolled { .. } => "PLAYER_ROLLED",
            Self::PlayerAnswered { .. } => "PLAYER_ANSWERED",
            Self::ResetGame { .. } => "RESET_GAME",
        }
    }
}

fn require_str(
    object: &serde_json::Map<String, Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, DecodeError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField { kind, field }),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(DecodeError::WrongFieldType { kind, field }),
    }
}
