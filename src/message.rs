// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Wire message encoding/decoding: the JSON-array envelope that wraps
//! every client and server frame (§6).

use serde::Serialize;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::event::Event;
use crate::filter::Filter;

/// A parsed client-to-server frame.
#[derive(Debug)]
pub enum ClientMessage {
    /// `["EVENT", <event>]` — the raw event object, not yet validated.
    Event(Value),
    /// `["REQ", <subscription_id>, <filter>, (<filter>, ...)]`
    Req {
        /// Client-chosen subscription identifier.
        subscription_id: String,
        /// One or more filters, OR'd together.
        filters: Vec<Filter>,
    },
    /// `["CLOSE", <subscription_id>]`
    Close {
        /// The subscription to drop.
        subscription_id: String,
    },
}

impl ClientMessage {
    /// Parse one text frame. A frame that isn't a JSON array, or whose
    /// first element isn't a recognized command, is a [`ProtocolError`];
    /// per §4.7 the caller logs and skips it rather than tearing down the
    /// connection.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(|_| ProtocolError::InvalidJson)?;
        let arr = value.as_array().ok_or(ProtocolError::InvalidJson)?;
        let command = arr
            .first()
            .and_then(Value::as_str)
            .ok_or(ProtocolError::InvalidJson)?;

        match command {
            "EVENT" => {
                let event = arr
                    .get(1)
                    .cloned()
                    .ok_or(ProtocolError::MalformedFrame("EVENT"))?;
                Ok(Self::Event(event))
            }
            "REQ" => {
                if arr.len() < 3 {
                    return Err(ProtocolError::MalformedFrame("REQ"));
                }
                let subscription_id = arr
                    .get(1)
                    .and_then(Value::as_str)
                    .ok_or(ProtocolError::MalformedFrame("REQ"))?
                    .to_owned();
                let filters = arr[2..]
                    .iter()
                    .map(|v| serde_json::from_value(v.clone()))
                    .collect::<Result<Vec<Filter>, _>>()
                    .map_err(|_| ProtocolError::MalformedFrame("REQ"))?;
                Ok(Self::Req {
                    subscription_id,
                    filters,
                })
            }
            "CLOSE" => {
                let subscription_id = arr
                    .get(1)
                    .and_then(Value::as_str)
                    .ok_or(ProtocolError::MalformedFrame("CLOSE"))?
                    .to_owned();
                Ok(Self::Close { subscription_id })
            }
            _ => Err(ProtocolError::UnknownCommand),
        }
    }
}

/// A server-to-client frame.
#[derive(Debug, Clone)]
pub enum RelayMessage {
    /// `["EVENT", <subscription_id>, <event>]`
    Event {
        /// The subscription this event is being delivered for.
        subscription_id: String,
        /// The delivered event.
        event: Event,
    },
    /// `["OK", <event_id>, <true|false>, <message>]`
    Ok {
        /// Hex id of the event this is a receipt for (or a placeholder,
        /// see §9 / SPEC_FULL §C.1, when none could be computed).
        event_id: String,
        /// Whether the event was accepted.
        accepted: bool,
        /// Human-readable detail, empty on success.
        message: String,
    },
    /// `["NOTICE", <message>]`
    Notice {
        /// Human-readable text.
        message: String,
    },
    /// `["EOSE", <subscription_id>]`
    Eose {
        /// The subscription whose backfill just finished.
        subscription_id: String,
    },
}

impl RelayMessage {
    /// Build an `EVENT` frame.
    pub fn event(subscription_id: String, event: Event) -> Self {
        Self::Event {
            subscription_id,
            event,
        }
    }

    /// Build an `OK` frame.
    pub fn ok(event_id: String, accepted: bool, message: impl Into<String>) -> Self {
        Self::Ok {
            event_id,
            accepted,
            message: message.into(),
        }
    }

    /// Build a `NOTICE` frame.
    pub fn notice(message: impl Into<String>) -> Self {
        Self::Notice {
            message: message.into(),
        }
    }

    /// Build an `EOSE` frame.
    pub fn eose(subscription_id: String) -> Self {
        Self::Eose { subscription_id }
    }

    /// Serialize to the wire JSON-array form.
    pub fn to_json(&self) -> String {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum Frame<'a> {
            Event(&'a str, &'a str, &'a Event),
            Ok(&'a str, &'a str, &'a str, &'a str),
            Notice(&'a str, &'a str),
            Eose(&'a str, &'a str),
        }

        let frame = match self {
            Self::Event {
                subscription_id,
                event,
            } => Frame::Event("EVENT", subscription_id, event),
            Self::Ok {
                event_id,
                accepted,
                message,
            } => Frame::Ok("OK", event_id, if *accepted { "true" } else { "false" }, message),
            Self::Notice { message } => Frame::Notice("NOTICE", message),
            Self::Eose { subscription_id } => Frame::Eose("EOSE", subscription_id),
        };

        serde_json::to_string(&frame).expect("relay messages always serialize")
    }
}
