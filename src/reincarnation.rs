//! Reincarnation codes - image-free transport for a four-field character seed.
//!
//! Wire form: `IZ-REIN-V25:` + base64(JSON `{n, d, p, s}`). A bare JSON object
//! with the same fields is also accepted on decode.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::encoding;
use crate::id::IdGenerator;
use crate::soulcore::SoulCorePackage;

pub const REINCARNATION_PREFIX: &str = "IZ-REIN-V25:";

pub const UNNAMED_SOUL: &str = "Unnamed Soul";

pub const REINCARNATION_TAGS: [&str; 2] = ["REINCARNATED", "V25"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReincarnationError {
    /// Neither the versioned prefix nor a JSON object.
    #[error("Unrecognized reincarnation code format")]
    Unrecognized,

    /// A recognized format whose contents failed to decode.
    #[error("Malformed reincarnation code: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReincarnationCode {
    /// Name
    pub n: String,
    /// Description
    pub d: String,
    /// Personality
    pub p: String,
    /// Scenario
    pub s: String,
}

impl ReincarnationCode {
    /// Seed a code from a SoulCore package.
    pub fn from_package(package: &SoulCorePackage) -> Self {
        let core = &package.soul_core;
        Self {
            n: core.id.clone(),
            d: core.persona_jp.clone(),
            p: core.constraints.join("\n"),
            s: core.seed_facts.join("\n"),
        }
    }
}

/// Display record rebuilt from a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReincarnatedCard {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub raw: ReincarnationCode,
}

pub fn encode(code: &ReincarnationCode) -> crate::error::Result<String> {
    let json = serde_json::to_string(code)?;
    Ok(format!("{}{}", REINCARNATION_PREFIX, encoding::encode(json.as_bytes())))
}

/// Decode with the process-wide id generator.
pub fn decode(code: &str) -> Result<ReincarnatedCard, ReincarnationError> {
    decode_with(code, IdGenerator::global())
}

/// Decode, drawing the card id suffix from `ids`.
pub fn decode_with(code: &str, ids: &IdGenerator) -> Result<ReincarnatedCard, ReincarnationError> {
    let raw_json = if let Some(b64) = code.strip_prefix(REINCARNATION_PREFIX) {
        let bytes = encoding::decode(b64)
            .map_err(|e| ReincarnationError::Malformed(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ReincarnationError::Malformed(e.to_string()))?
    } else if code.trim().starts_with('{') {
        code.trim().to_string()
    } else {
        return Err(ReincarnationError::Unrecognized);
    };

    let value: Value = serde_json::from_str(&raw_json)
        .map_err(|e| ReincarnationError::Malformed(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ReincarnationError::Malformed("payload is not a JSON object".into()))?;

    let raw = ReincarnationCode {
        n: string_field(object, "n")?,
        d: string_field(object, "d")?,
        p: string_field(object, "p")?,
        s: string_field(object, "s")?,
    };

    let label = if raw.n.is_empty() { "soul" } else { raw.n.as_str() };
    let name = if raw.n.is_empty() { UNNAMED_SOUL.to_string() } else { raw.n.clone() };

    Ok(ReincarnatedCard {
        id: ids.generate_id(&format!("rein-{}", label)),
        name,
        summary: raw.d.clone(),
        tags: REINCARNATION_TAGS.iter().map(|t| t.to_string()).collect(),
        raw,
    })
}

/// Collapses every failure into `None`, for callers that only care whether
/// a usable card came out.
pub fn decode_lenient(code: &str) -> Option<ReincarnatedCard> {
    match decode(code) {
        Ok(card) => Some(card),
        Err(e) => {
            tracing::debug!(error = %e, "reincarnation code rejected");
            None
        }
    }
}

/// Absent or null fields read as empty; any other non-string is malformed.
fn string_field(object: &Map<String, Value>, key: &str) -> Result<String, ReincarnationError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ReincarnationError::Malformed(format!(
            "field `{}` must be a string, got {}",
            key, other
        ))),
    }
}
