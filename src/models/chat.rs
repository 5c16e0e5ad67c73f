use serde::{ Serialize, Deserialize };

/// Which side of the conversation produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

/// One entry in a conversation transcript.
///
/// Text is stored verbatim, newlines included; renderers must preserve
/// whitespace. `error` marks a relayed failure rendered in assistant style
/// rather than a genuine answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub origin: Origin,
    /// Creation time in epoch milliseconds, display-only.
    pub timestamp: i64,
    pub error: bool,
}
