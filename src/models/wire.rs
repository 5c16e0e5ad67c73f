use serde::{ Serialize, Deserialize };

/// Prior turns included with each outbound chat request. Older entries are
/// silently dropped; there is no compaction or summarization.
pub const HISTORY_WINDOW: usize = 10;

/// Body of `POST /api/chat`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "conversationHistory", default)]
    pub conversation_history: Vec<HistoryEntry>,
}

/// One prior transcript turn as it travels on the wire. `isBot` is the
/// wire-level stand-in for the client's origin enum: true marks an
/// assistant turn, false a user turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    #[serde(rename = "isBot")]
    pub is_bot: bool,
}

/// Uniform relay reply: exactly one of `response` or `error`, never both,
/// never neither.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Envelope {
    Success { response: String },
    Failure { error: String },
}
