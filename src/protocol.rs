//! Wire protocol types.
//!
//! Every message on the substrate is a single line of JSON: an envelope
//! carrying source and destination node ids plus a body. The body has
//! optional `msg_id` / `in_reply_to` correlation fields and a tagged
//! payload discriminated by its `"type"` field.
//!
//! Three payload families share the enum:
//!
//! - the **client protocol**: `send`, `poll`, `commit_offsets`,
//!   `list_committed_offsets` and their `_ok` replies;
//! - the **peer protocol**: `internal_send`, issued by a non-leader to the
//!   key's leader;
//! - the **store protocol**: `read`, `write`, `cas` issued to the KV
//!   service, and the `init` handshake the workbench opens with.
//!
//! `error` is the universal failure reply; see [`crate::error::ErrorCode`]
//! for the code vocabulary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Offset, Record, StreamKey, Value};

/// A routed message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Sender node id.
    pub src: String,
    /// Destination node or service id.
    pub dest: String,
    /// Correlation fields plus the typed payload.
    pub body: Body,
}

/// Message body: correlation metadata plus the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Body {
    /// Unique id of this message on the sender, when a reply is expected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<u64>,
    /// The `msg_id` this body replies to, if it is a reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<u64>,
    /// The typed payload.
    #[serde(flatten)]
    pub payload: Payload,
}

impl Body {
    /// Body for a fresh request.
    pub fn request(msg_id: u64, payload: Payload) -> Self {
        Body {
            msg_id: Some(msg_id),
            in_reply_to: None,
            payload,
        }
    }

    /// Body replying to `in_reply_to`.
    pub fn reply(msg_id: u64, in_reply_to: u64, payload: Payload) -> Self {
        Body {
            msg_id: Some(msg_id),
            in_reply_to: Some(in_reply_to),
            payload,
        }
    }
}

/// Typed message payloads, discriminated by the wire `"type"` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Workbench handshake: assigns this node its id and the roster.
    Init {
        /// This node's identity.
        node_id: String,
        /// Every node participating, this one included.
        node_ids: Vec<String>,
    },
    /// Handshake acknowledgment.
    InitOk,

    /// Produce a record to a stream.
    Send {
        /// Target stream.
        key: StreamKey,
        /// Record payload.
        msg: Value,
    },
    /// Produce succeeded; the record was assigned `offset`.
    SendOk {
        /// Offset the record landed at.
        offset: Offset,
    },

    /// Peer-only produce, issued by a non-leader to the key's leader.
    InternalSend {
        /// Target stream.
        key: StreamKey,
        /// Record payload.
        msg: Value,
    },
    /// Leader's reply to an `internal_send`.
    InternalSendOk {
        /// Offset the record landed at.
        offset: Offset,
    },

    /// Read records from one or more streams, starting at per-key cursors.
    Poll {
        /// Stream key to starting offset (inclusive).
        offsets: HashMap<StreamKey, Offset>,
    },
    /// Poll reply: per key, ascending contiguous `[offset, value]` pairs.
    PollOk {
        /// Records per stream, starting at the requested cursor.
        msgs: HashMap<StreamKey, Vec<Record>>,
    },

    /// Advance consumer-committed offsets.
    CommitOffsets {
        /// Stream key to highest processed offset.
        offsets: HashMap<StreamKey, Offset>,
    },
    /// Commit acknowledgment.
    CommitOffsetsOk,

    /// Fetch committed offsets for the given streams.
    ListCommittedOffsets {
        /// Streams to look up.
        keys: Vec<StreamKey>,
    },
    /// Committed offsets; streams never committed are omitted.
    ListCommittedOffsetsOk {
        /// Stream key to committed offset.
        offsets: HashMap<StreamKey, Offset>,
    },

    /// Store protocol: read a key.
    Read {
        /// Store key.
        key: String,
    },
    /// Store protocol: read succeeded.
    ReadOk {
        /// Stored value.
        value: i64,
    },
    /// Store protocol: unconditional overwrite.
    Write {
        /// Store key.
        key: String,
        /// Value to store.
        value: i64,
    },
    /// Store protocol: write succeeded.
    WriteOk,
    /// Store protocol: conditional write.
    ///
    /// `from: null` together with `create_if_not_exists: true` succeeds only
    /// if the key was never written, which makes first initialization
    /// race-free.
    Cas {
        /// Store key.
        key: String,
        /// Expected current value; `null` is the absent sentinel.
        from: Option<i64>,
        /// Replacement value.
        to: i64,
        /// Create the key when absent instead of failing.
        #[serde(default)]
        create_if_not_exists: bool,
    },
    /// Store protocol: compare-and-swap succeeded.
    CasOk,

    /// Universal failure reply.
    Error {
        /// Wire error code; see [`crate::error::ErrorCode`].
        code: i64,
        /// Human-readable detail.
        #[serde(default)]
        text: String,
    },
}

impl Payload {
    /// Short name of the payload type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Init { .. } => "init",
            Payload::InitOk => "init_ok",
            Payload::Send { .. } => "send",
            Payload::SendOk { .. } => "send_ok",
            Payload::InternalSend { .. } => "internal_send",
            Payload::InternalSendOk { .. } => "internal_send_ok",
            Payload::Poll { .. } => "poll",
            Payload::PollOk { .. } => "poll_ok",
            Payload::CommitOffsets { .. } => "commit_offsets",
            Payload::CommitOffsetsOk => "commit_offsets_ok",
            Payload::ListCommittedOffsets { .. } => "list_committed_offsets",
            Payload::ListCommittedOffsetsOk { .. } => "list_committed_offsets_ok",
            Payload::Read { .. } => "read",
            Payload::ReadOk { .. } => "read_ok",
            Payload::Write { .. } => "write",
            Payload::WriteOk => "write_ok",
            Payload::Cas { .. } => "cas",
            Payload::CasOk => "cas_ok",
            Payload::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Offset;

    #[test]
    fn test_parse_send_request() {
        let line = r#"{"src":"c1","dest":"n0","body":{"type":"send","msg_id":2,"key":"x","msg":10}}"#;
        let msg: Message = serde_json::from_str(line).unwrap();
        assert_eq!(msg.src, "c1");
        assert_eq!(msg.body.msg_id, Some(2));
        assert_eq!(
            msg.body.payload,
            Payload::Send {
                key: "x".into(),
                msg: 10
            }
        );
    }

    #[test]
    fn test_send_ok_reply_shape() {
        let msg = Message {
            src: "n0".into(),
            dest: "c1".into(),
            body: Body::reply(7, 2, Payload::SendOk { offset: Offset::new(0) }),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["body"]["type"], "send_ok");
        assert_eq!(json["body"]["offset"], 0);
        assert_eq!(json["body"]["in_reply_to"], 2);
    }

    #[test]
    fn test_poll_ok_pairs_shape() {
        let mut msgs = HashMap::new();
        msgs.insert("x".to_string(), vec![(Offset::new(1), 20)]);
        let json = serde_json::to_value(Payload::PollOk { msgs }).unwrap();
        assert_eq!(json["msgs"]["x"][0][0], 1);
        assert_eq!(json["msgs"]["x"][0][1], 20);
    }

    #[test]
    fn test_cas_absent_sentinel_serializes_null() {
        let payload = Payload::Cas {
            key: "counter:x".into(),
            from: None,
            to: 1,
            create_if_not_exists: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["from"].is_null());
        assert_eq!(json["create_if_not_exists"], true);
    }

    #[test]
    fn test_parse_error_reply_without_text() {
        let body: Body =
            serde_json::from_str(r#"{"type":"error","in_reply_to":4,"code":22}"#).unwrap();
        assert_eq!(
            body.payload,
            Payload::Error {
                code: 22,
                text: String::new()
            }
        );
    }

    #[test]
    fn test_init_round_trip() {
        let line = r#"{"type":"init","msg_id":1,"node_id":"n1","node_ids":["n1","n0","n2"]}"#;
        let body: Body = serde_json::from_str(line).unwrap();
        match body.payload {
            Payload::Init { node_id, node_ids } => {
                assert_eq!(node_id, "n1");
                assert_eq!(node_ids.len(), 3);
            }
            other => panic!("expected init, got {}", other.kind()),
        }
    }

    #[test]
    fn test_request_body_omits_in_reply_to() {
        let body = Body::request(3, Payload::Read { key: "k".into() });
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("in_reply_to").is_none());
        assert_eq!(json["type"], "read");
    }
}
