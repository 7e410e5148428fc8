//! Node RPC message vocabulary.
//!
//! Every message is a single-key object naming its kind, mirroring the node's
//! RPC envelope:
//! ```json
//! {"getBlockTemplateRequest": {"payAddress": "...", "extraData": "..."}}
//! ```
//! Kinds ending in `Response` answer a request and release one unit of
//! outbound credit when received. Notifications arrive unsolicited and
//! release nothing.

use serde::{Deserialize, Serialize};

use crate::header::RpcBlock;

/// Error text carried by a response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetInfoRequestMessage {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetInfoResponseMessage {
    pub server_version: String,
    pub is_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetBlockDagInfoRequestMessage {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetBlockDagInfoResponseMessage {
    pub network_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotifyNewBlockTemplateRequestMessage {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyNewBlockTemplateResponseMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewBlockTemplateNotificationMessage {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBlockTemplateRequestMessage {
    pub pay_address: String,
    pub extra_data: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetBlockTemplateResponseMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<RpcBlock>,
    pub is_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBlockRequestMessage {
    pub block: RpcBlock,
    pub allow_non_daa_blocks: bool,
}

/// Why the node refused a submitted block. Zero means accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RejectReason(pub i32);

impl RejectReason {
    pub const NONE: Self = Self(0);
    pub const BLOCK_INVALID: Self = Self(1);
    pub const IS_IN_IBD: Self = Self(2);

    pub fn is_rejected(self) -> bool {
        self != Self::NONE
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::NONE => f.write_str("NONE"),
            Self::BLOCK_INVALID => f.write_str("BLOCK_INVALID"),
            Self::IS_IN_IBD => f.write_str("IS_IN_IBD"),
            Self(other) => write!(f, "{other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitBlockResponseMessage {
    pub reject_reason: RejectReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// A message exchanged with the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KaspadMessage {
    GetInfoRequest(GetInfoRequestMessage),
    GetInfoResponse(GetInfoResponseMessage),
    GetBlockDagInfoRequest(GetBlockDagInfoRequestMessage),
    GetBlockDagInfoResponse(GetBlockDagInfoResponseMessage),
    NotifyNewBlockTemplateRequest(NotifyNewBlockTemplateRequestMessage),
    NotifyNewBlockTemplateResponse(NotifyNewBlockTemplateResponseMessage),
    NewBlockTemplateNotification(NewBlockTemplateNotificationMessage),
    GetBlockTemplateRequest(GetBlockTemplateRequestMessage),
    GetBlockTemplateResponse(GetBlockTemplateResponseMessage),
    SubmitBlockRequest(SubmitBlockRequestMessage),
    SubmitBlockResponse(SubmitBlockResponseMessage),
}

impl KaspadMessage {
    /// Every kind name this vocabulary understands.
    pub const KINDS: &'static [&'static str] = &[
        "getInfoRequest",
        "getInfoResponse",
        "getBlockDagInfoRequest",
        "getBlockDagInfoResponse",
        "notifyNewBlockTemplateRequest",
        "notifyNewBlockTemplateResponse",
        "newBlockTemplateNotification",
        "getBlockTemplateRequest",
        "getBlockTemplateResponse",
        "submitBlockRequest",
        "submitBlockResponse",
    ];

    /// Name of this message's kind, as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetInfoRequest(_) => "getInfoRequest",
            Self::GetInfoResponse(_) => "getInfoResponse",
            Self::GetBlockDagInfoRequest(_) => "getBlockDagInfoRequest",
            Self::GetBlockDagInfoResponse(_) => "getBlockDagInfoResponse",
            Self::NotifyNewBlockTemplateRequest(_) => "notifyNewBlockTemplateRequest",
            Self::NotifyNewBlockTemplateResponse(_) => "notifyNewBlockTemplateResponse",
            Self::NewBlockTemplateNotification(_) => "newBlockTemplateNotification",
            Self::GetBlockTemplateRequest(_) => "getBlockTemplateRequest",
            Self::GetBlockTemplateResponse(_) => "getBlockTemplateResponse",
            Self::SubmitBlockRequest(_) => "submitBlockRequest",
            Self::SubmitBlockResponse(_) => "submitBlockResponse",
        }
    }

    /// Whether this message answers a request (and so returns credit).
    pub fn is_response(&self) -> bool {
        self.kind().ends_with("Response")
    }

    /// Server-supplied error text, if the message carries a non-empty one.
    pub fn error(&self) -> Option<&str> {
        let error = match self {
            Self::GetInfoResponse(m) => m.error.as_ref(),
            Self::GetBlockDagInfoResponse(m) => m.error.as_ref(),
            Self::NotifyNewBlockTemplateResponse(m) => m.error.as_ref(),
            Self::GetBlockTemplateResponse(m) => m.error.as_ref(),
            Self::SubmitBlockResponse(m) => m.error.as_ref(),
            _ => None,
        };
        error
            .map(|e| e.message.as_str())
            .filter(|message| !message.is_empty())
    }

    pub fn get_info() -> Self {
        Self::GetInfoRequest(GetInfoRequestMessage {})
    }

    pub fn get_block_dag_info() -> Self {
        Self::GetBlockDagInfoRequest(GetBlockDagInfoRequestMessage {})
    }

    pub fn notify_new_block_template() -> Self {
        Self::NotifyNewBlockTemplateRequest(NotifyNewBlockTemplateRequestMessage {})
    }

    pub fn get_block_template(pay_address: &str, extra_data: &str) -> Self {
        Self::GetBlockTemplateRequest(GetBlockTemplateRequestMessage {
            pay_address: pay_address.to_string(),
            extra_data: extra_data.to_string(),
        })
    }

    pub fn submit_block(block: RpcBlock) -> Self {
        Self::SubmitBlockRequest(SubmitBlockRequestMessage {
            block,
            allow_non_daa_blocks: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_envelope() {
        let msg = KaspadMessage::get_block_template("kaspa:qq", "tag");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"getBlockTemplateRequest": {"payAddress": "kaspa:qq", "extraData": "tag"}})
        );

        let msg = KaspadMessage::get_info();
        assert_eq!(serde_json::to_value(&msg).unwrap(), json!({"getInfoRequest": {}}));
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        let messages = [
            KaspadMessage::get_info(),
            KaspadMessage::get_block_dag_info(),
            KaspadMessage::notify_new_block_template(),
            KaspadMessage::NewBlockTemplateNotification(Default::default()),
            KaspadMessage::SubmitBlockResponse(Default::default()),
        ];
        for msg in messages {
            let value = serde_json::to_value(&msg).unwrap();
            let tag = value.as_object().unwrap().keys().next().unwrap().clone();
            assert_eq!(tag, msg.kind());
            assert!(KaspadMessage::KINDS.contains(&msg.kind()));
        }
    }

    #[test]
    fn test_response_classification() {
        assert!(KaspadMessage::GetInfoResponse(Default::default()).is_response());
        assert!(KaspadMessage::SubmitBlockResponse(Default::default()).is_response());
        assert!(!KaspadMessage::NewBlockTemplateNotification(Default::default()).is_response());
        assert!(!KaspadMessage::get_info().is_response());
    }

    #[test]
    fn test_error_text() {
        let msg: KaspadMessage = serde_json::from_value(json!({
            "submitBlockResponse": {"rejectReason": 1, "error": {"message": "bad pow"}}
        }))
        .unwrap();
        assert_eq!(msg.error(), Some("bad pow"));

        let KaspadMessage::SubmitBlockResponse(resp) = &msg else {
            panic!("wrong kind");
        };
        assert!(resp.reject_reason.is_rejected());
        assert_eq!(resp.reject_reason.to_string(), "BLOCK_INVALID");

        // Empty error text means no error
        let msg: KaspadMessage = serde_json::from_value(json!({
            "getInfoResponse": {"serverVersion": "1.0", "error": {"message": ""}}
        }))
        .unwrap();
        assert_eq!(msg.error(), None);
    }

    #[test]
    fn test_unknown_kind_fails_to_decode() {
        let result = serde_json::from_value::<KaspadMessage>(json!({"pingRequest": {}}));
        assert!(result.is_err());
        assert!(!KaspadMessage::KINDS.contains(&"pingRequest"));
    }
}
