use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A dead-letter record as it is published to the DLQ topic, see spec
/// §3 and §8 property 7 (byte-for-byte fidelity of the original
/// message). `headers` and `value` are exactly what was read off the
/// original message; `dlq_reason` is the only thing the runtime adds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DlqRecord {
    pub original_topic: String,
    pub partition: i32,
    pub offset: i64,
    pub headers: HashMap<String, String>,
    pub value: Vec<u8>,
    pub error: String,
    pub first_attempted_at: chrono::DateTime<chrono::Utc>,
    pub last_attempted_at: chrono::DateTime<chrono::Utc>,
}
