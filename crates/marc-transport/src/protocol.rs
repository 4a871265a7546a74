//! Wire protocol for HTTP clients.
//!
//! Request fields are optional at the type level so a missing field yields
//! a 400 with a readable message instead of a generic rejection.

use marc_core::{Briefing, Message, MessageId, MessageKind, Topic};
use marc_store::SearchQuery;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/post`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostRequest {
    pub name: Option<String>,
    pub target: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<MessageKind>,
}

/// Body of `POST /api/errata`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrataRequest {
    pub message_id: Option<MessageId>,
    pub new_message: Option<String>,
}

/// Body of `POST /api/join` and `POST /api/part`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipRequest {
    pub name: Option<String>,
    pub target: Option<String>,
}

/// Body carrying a single name: `dismiss` and `channels/delete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameRequest {
    pub name: Option<String>,
}

/// Body of `POST /api/topic`. The setter defaults to the human operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicRequest {
    pub name: Option<String>,
    pub target: Option<String>,
    pub topic: Option<String>,
}

/// Setter recorded when a topic is set without a name.
pub const OPERATOR_NAME: &str = "human";

/// Body of `POST /api/briefing`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BriefingRequest {
    pub text: Option<String>,
}

/// Body of `POST /api/rename`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub agent_id: Option<String>,
    pub name: Option<String>,
}

/// Query of `GET /api/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub target: Option<String>,
    pub sender: Option<String>,
    pub limit: Option<usize>,
}

impl From<SearchParams> for SearchQuery {
    fn from(params: SearchParams) -> Self {
        let defaults = Self::default();
        Self {
            query: params.query,
            target: params.target,
            sender: params.sender,
            limit: params.limit.unwrap_or(defaults.limit),
        }
    }
}

/// Query of `GET /api/context/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextParams {
    pub before: Option<usize>,
    pub after: Option<usize>,
}

/// Bare acknowledgement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Self = Self { ok: true };
}

/// Response to `POST /api/post`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub ok: bool,
    pub id: MessageId,
}

/// Response to `POST /api/join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub ok: bool,
    pub history: Vec<Message>,
    pub topic: Option<Topic>,
}

/// Response to `POST /api/topic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicResponse {
    pub ok: bool,
    pub topic: Topic,
}

/// Response to `POST /api/briefing`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingResponse {
    pub ok: bool,
    pub briefing: Briefing,
}

/// Response to `GET /api/whoami/{agentId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmI {
    pub name: String,
}
