//! Client frame parsing.
//!
//! Frames are JSON objects `{"event": <name>, "data": {...}}`. Only
//! `user_query` is acted on; other event names are ignored.

use farmmate_relay::protocol::USER_QUERY_EVENT;
use farmmate_relay::{Language, UserQuery};
use serde::Deserialize;
use serde_json::Value;

/// What an inbound client frame asks for.
#[derive(Debug, PartialEq)]
pub enum Inbound {
    /// A query to relay.
    Query(UserQuery),
    /// A well-formed frame for an event the gateway does not handle.
    Ignored(String),
    /// Unparseable frame.
    Malformed {
        /// For logs only.
        reason: String,
        /// Language to report the failure in, when the frame names one.
        language: Language,
    },
}

#[derive(Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Classify one text frame.
pub fn parse_frame(text: &str) -> Inbound {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            return Inbound::Malformed {
                reason: format!("invalid frame: {e}"),
                language: Language::DEFAULT,
            };
        }
    };
    if frame.event != USER_QUERY_EVENT {
        return Inbound::Ignored(frame.event);
    }
    let language = Language::resolve(frame.data.get("language").and_then(Value::as_str));
    match serde_json::from_value::<UserQuery>(frame.data) {
        Ok(query) => Inbound::Query(query),
        Err(e) => Inbound::Malformed {
            reason: format!("invalid {USER_QUERY_EVENT} data: {e}"),
            language,
        },
    }
}
