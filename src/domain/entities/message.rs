//! Cross-context message protocol
//!
//! The wire contract between the scan context, the privileged relay and the
//! control surface. Every request is a JSON object with a `type`
//! discriminant; both ends are loaded independently, so field names here
//! must not change.

use super::snapshot::ScanSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Browser tab hosting a scan context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab:{}", self.0)
    }
}

/// Whether the sender keeps the channel open for an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    AwaitReply,
    FireAndForget,
}

/// Requests exchanged between contexts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Scan context asks the relay for image bytes it may not read itself
    FetchImage { url: String },
    /// Scan context reports its finding count
    UpdateBadge { count: usize },
    /// Control surface switches scanning on or off
    ToggleScanning { enabled: bool },
    /// Control surface asks for the current snapshot
    GetResults,
}

impl Request {
    pub fn reply_mode(&self) -> ReplyMode {
        match self {
            Request::UpdateBadge { .. } => ReplyMode::FireAndForget,
            Request::FetchImage { .. } | Request::ToggleScanning { .. } | Request::GetResults => {
                ReplyMode::AwaitReply
            }
        }
    }

    /// Wire discriminant, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Request::FetchImage { .. } => "FETCH_IMAGE",
            Request::UpdateBadge { .. } => "UPDATE_BADGE",
            Request::ToggleScanning { .. } => "TOGGLE_SCANNING",
            Request::GetResults => "GET_RESULTS",
        }
    }
}

/// Answer to `FETCH_IMAGE`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchImageReply {
    #[serde(rename = "dataUrl")]
    pub data_url: Option<String>,
}

/// Any reply a handler can produce
///
/// Serialized without a wrapper; the requester knows which body to expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Image(FetchImageReply),
    Snapshot(ScanSnapshot),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let req = Request::FetchImage {
            url: "https://a/b.png".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"type": "FETCH_IMAGE", "url": "https://a/b.png"})
        );
        assert_eq!(
            serde_json::to_value(Request::GetResults).unwrap(),
            json!({"type": "GET_RESULTS"})
        );
        let parsed: Request =
            serde_json::from_value(json!({"type": "TOGGLE_SCANNING", "enabled": true})).unwrap();
        assert_eq!(parsed, Request::ToggleScanning { enabled: true });
    }

    #[test]
    fn test_unknown_type_rejected() {
        let parsed = serde_json::from_value::<Request>(json!({"type": "SELF_DESTRUCT"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_reply_modes() {
        assert_eq!(
            Request::UpdateBadge { count: 1 }.reply_mode(),
            ReplyMode::FireAndForget
        );
        assert_eq!(Request::GetResults.reply_mode(), ReplyMode::AwaitReply);
    }

    #[test]
    fn test_fetch_reply_null() {
        let reply = Reply::Image(FetchImageReply::default());
        assert_eq!(serde_json::to_value(reply).unwrap(), json!({"dataUrl": null}));
    }
}
