// MIT License - Copyright (c) 2026 Peter Wright

//! Wire format of the panel's control service.
//!
//! Every message is a single JSON document over the persistent TLS stream.
//! There is no length prefix and no delimiter: message boundaries can only be
//! recovered by attempting a parse, which is what [`FrameAssembler`] does.
//! The one non-JSON token on the wire is a bare `ACK` the panel sends to
//! acknowledge outbound commands.

use serde::{Deserialize, Deserializer, Serialize};

/// Protocol version carried by every outbound frame.
pub const WIRE_VERSION: u32 = 1;

/// Source identifier the control service expects from third-party clients.
pub const WIRE_SOURCE: &str = "C4";

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// Top-level inbound frame.
///
/// Every field except `event` is populated only for some event types, so
/// everything is optional here and validated during dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub info_type: Option<String>,
    #[serde(default)]
    pub zone_event_type: Option<String>,
    #[serde(default)]
    pub arming_type: Option<String>,
    #[serde(default)]
    pub alarm_type: Option<String>,
    #[serde(default, deserialize_with = "opt_u32_from_string_or_number")]
    pub partition_id: Option<u32>,
    #[serde(default)]
    pub partition_list: Vec<PartitionPayload>,
    #[serde(default)]
    pub zone: Option<ZonePayload>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One partition entry of a SUMMARY roster.
#[derive(Debug, Clone, Deserialize)]
pub struct PartitionPayload {
    // The panel encodes partition ids as strings in summaries but as numbers
    // in ARMING/ALARM frames; accept both everywhere.
    #[serde(deserialize_with = "u32_from_string_or_number")]
    pub partition_id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub secure_arm: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub zone_list: Vec<ZonePayload>,
}

/// A zone entry, either nested in a summary or carried by a ZONE_EVENT.
#[derive(Debug, Clone, Deserialize)]
pub struct ZonePayload {
    pub zone_id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "opt_u32_from_string_or_number")]
    pub partition_id: Option<u32>,
    #[serde(rename = "type", default)]
    pub zone_type: String,
    #[serde(default)]
    pub status: String,
}

fn u32_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(u32),
        Str(String),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid numeric id: {s:?}"))),
    }
}

fn opt_u32_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(u32),
        Str(String),
    }

    Option::<NumOrStr>::deserialize(deserializer)?
        .map(|v| match v {
            NumOrStr::Num(n) => Ok(n),
            NumOrStr::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid numeric id: {s:?}"))),
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Outbound frames
// ---------------------------------------------------------------------------

/// INFO/SUMMARY request — asks the panel for its full partition/zone roster.
///
/// Field order matches the wire format the panel's control service is known
/// to accept; keep it stable.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest<'a> {
    pub nonce: &'a str,
    pub action: &'a str,
    pub info_type: &'a str,
    pub version: u32,
    pub source: &'a str,
    pub token: &'a str,
}

impl<'a> SummaryRequest<'a> {
    pub fn new(token: &'a str) -> Self {
        Self {
            nonce: "",
            action: "INFO",
            info_type: "SUMMARY",
            version: WIRE_VERSION,
            source: WIRE_SOURCE,
            token,
        }
    }
}

/// ARMING command — arm or disarm one partition.
#[derive(Debug, Clone, Serialize)]
pub struct ArmingRequest<'a> {
    pub version: u32,
    pub source: &'a str,
    pub action: &'a str,
    pub nonce: &'a str,
    pub token: &'a str,
    pub user_code: &'a str,
    pub partition_id: u32,
    pub arming_type: &'a str,
    pub delay: u32,
    pub bypass: bool,
}

impl<'a> ArmingRequest<'a> {
    pub fn new(
        token: &'a str,
        user_code: &'a str,
        partition_id: u32,
        arming_type: &'a str,
        delay: u32,
        bypass: bool,
    ) -> Self {
        Self {
            version: WIRE_VERSION,
            source: WIRE_SOURCE,
            action: "ARMING",
            nonce: "",
            token,
            user_code,
            partition_id,
            arming_type,
            delay,
            bypass,
        }
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Check whether an inbound chunk is a bare acknowledgment frame.
pub fn is_ack(chunk: &[u8]) -> bool {
    chunk.starts_with(b"ACK")
}

/// Result of feeding one inbound chunk to the [`FrameAssembler`].
#[derive(Debug)]
pub enum FrameOutcome {
    /// Bare acknowledgment; any pending partial data was discarded.
    Ack,
    /// A complete frame was reassembled and parsed.
    Frame { payload: EventPayload, raw: String },
    /// The data does not parse yet; it is held until the next chunk arrives.
    Buffered,
    /// The pending data exceeded the configured bound and was discarded.
    /// The stream can no longer be framed reliably.
    Overflow { buffered: usize },
}

/// Reassembles JSON frames from arbitrarily fragmented reads.
///
/// A failed parse is the expected signal that a frame is still incomplete,
/// not an error: the bytes are buffered and retried with the next chunk
/// appended. `ACK` frames clear the buffer, since the panel only sends them
/// between JSON documents.
#[derive(Debug)]
pub struct FrameAssembler {
    partial: Vec<u8>,
    max_bytes: usize,
}

impl FrameAssembler {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            partial: Vec::new(),
            max_bytes,
        }
    }

    /// Bytes currently held in the partial buffer.
    pub fn pending(&self) -> usize {
        self.partial.len()
    }

    /// Drop any buffered partial data.
    pub fn clear(&mut self) {
        self.partial.clear();
    }

    /// Feed one inbound chunk and try to complete a frame.
    pub fn feed(&mut self, chunk: &[u8]) -> FrameOutcome {
        if is_ack(chunk) {
            self.partial.clear();
            return FrameOutcome::Ack;
        }

        let mut data = std::mem::take(&mut self.partial);
        data.extend_from_slice(chunk);

        match serde_json::from_slice::<EventPayload>(&data) {
            Ok(payload) => FrameOutcome::Frame {
                payload,
                raw: String::from_utf8_lossy(&data).into_owned(),
            },
            Err(_) if data.len() > self.max_bytes => FrameOutcome::Overflow {
                buffered: data.len(),
            },
            Err(_) => {
                self.partial = data;
                FrameOutcome::Buffered
            }
        }
    }
}
