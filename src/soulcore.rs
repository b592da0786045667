//! SoulCore document model
//!
//! The codec itself treats payloads as opaque text. These types are the
//! structured document that the application places inside that text.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::{embed, extract, id};

/// Keyword used when embedding a full SoulCore package.
pub const SOULCORE_KEYWORD: &str = "IZAKAYA_SOULCORE";

const PERSONA_MAX_CHARS: usize = 600;

/// Length of the base-36 part of an `sc_` id.
const SOULCORE_ID_SUFFIX_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoulCoreRole {
    Character,
    World,
    Scenario,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoulCore {
    pub id: String,
    pub language: String,
    pub role: SoulCoreRole,
    #[serde(rename = "personaJP")]
    pub persona_jp: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub ip_sanitized: bool,
    #[serde(default)]
    pub seed_facts: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceKind {
    VisualReconstruct,
    TextRevision,
    QrSync,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: ProvenanceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub engine: String,
    pub engine_version: String,
    #[serde(default)]
    pub edit_log: Vec<ProvenanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoulCorePackage {
    pub soul_core: SoulCore,
    /// Plot data is carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot3d: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// Partial update applied by [`merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeInstruction {
    #[serde(default, rename = "personaJP")]
    pub persona_jp: Option<String>,
    #[serde(default)]
    pub constraints: Option<Vec<String>>,
    #[serde(default)]
    pub seed_facts: Option<Vec<String>>,
    #[serde(default)]
    pub edit_note: Option<String>,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl SoulCore {
    /// Empty core with a fresh `sc_` id and both timestamps set to now.
    pub fn new(language: &str, role: SoulCoreRole) -> Self {
        let now = now_rfc3339();
        Self {
            id: format!("sc_{}", id::IdGenerator::global().suffix(SOULCORE_ID_SUFFIX_LEN)),
            language: language.to_string(),
            role,
            persona_jp: String::new(),
            constraints: vec![],
            ip_sanitized: true,
            seed_facts: vec![],
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl SoulCorePackage {
    pub fn new(soul_core: SoulCore) -> Self {
        Self {
            soul_core,
            plot3d: None,
            provenance: None,
        }
    }

    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_payload(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Append an edit-log entry, creating the provenance block if needed.
    pub fn record_edit(&mut self, kind: ProvenanceKind, note: Option<String>) {
        let provenance = self.provenance.get_or_insert_with(|| Provenance {
            engine: env!("CARGO_PKG_NAME").to_string(),
            engine_version: crate::ENGINE_VERSION.to_string(),
            edit_log: vec![],
        });
        provenance.edit_log.push(ProvenanceEntry {
            timestamp: Utc::now().timestamp_millis(),
            kind,
            note,
        });
    }
}

fn normalize_persona(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let broken = collapsed.replace('。', "。\n");
    broken.trim().chars().take(PERSONA_MAX_CHARS).collect()
}

fn trimmed_non_empty(items: &[String]) -> impl Iterator<Item = String> + '_ {
    items
        .iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

fn dedupe(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Tidy persona text and list fields; bumps `updatedAt`.
pub fn normalize(core: &SoulCore) -> SoulCore {
    SoulCore {
        persona_jp: normalize_persona(&core.persona_jp),
        constraints: trimmed_non_empty(&core.constraints).collect(),
        seed_facts: dedupe(trimmed_non_empty(&core.seed_facts)),
        updated_at: now_rfc3339(),
        ..core.clone()
    }
}

/// Apply a partial update; bumps `updatedAt`.
pub fn merge(base: &SoulCore, delta: &MergeInstruction) -> SoulCore {
    let mut merged = base.clone();

    if let Some(persona) = &delta.persona_jp {
        merged.persona_jp = persona.clone();
    }
    if let Some(constraints) = &delta.constraints {
        merged.constraints = dedupe(constraints.iter().cloned());
    }
    if let Some(seed_facts) = &delta.seed_facts {
        merged.seed_facts = dedupe(seed_facts.iter().cloned());
    }
    if let Some(note) = delta.edit_note.as_deref().filter(|n| !n.is_empty()) {
        merged.seed_facts.push(format!("note:{}", note));
    }

    merged.updated_at = now_rfc3339();
    merged
}

/// Embed a package as JSON under [`SOULCORE_KEYWORD`].
pub fn embed_package(png: &[u8], package: &SoulCorePackage) -> Result<Vec<u8>> {
    embed::embed(png, SOULCORE_KEYWORD, &package.to_payload()?)
}

/// Extract and parse a package, undoing QR-asset wrapping if present.
pub fn extract_package(png: &[u8]) -> Result<Option<SoulCorePackage>> {
    match extract::extract(png)? {
        Some(text) => {
            let json = extract::resolve_payload(&text)?;
            Ok(Some(SoulCorePackage::from_payload(&json)?))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::tests::TINY_PNG;

    fn sample() -> SoulCore {
        let mut core = SoulCore::new("ja", SoulCoreRole::Character);
        core.persona_jp = "  明るい店主。   常連に優しい。 ".to_string();
        core.constraints = vec![" no spoilers ".into(), "".into(), "stay in character".into()];
        core.seed_facts = vec!["likes sake".into(), " likes sake ".into(), "  ".into(), "owns a cat".into()];
        core
    }

    #[test]
    fn test_new_core_shape() {
        let core = SoulCore::new("ja", SoulCoreRole::World);
        let suffix = core.id.strip_prefix("sc_").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
        assert_eq!(core.created_at, core.updated_at);
        assert!(core.ip_sanitized);
    }

    #[test]
    fn test_normalize() {
        let core = normalize(&sample());
        assert_eq!(core.persona_jp, "明るい店主。\n 常連に優しい。");
        assert_eq!(core.constraints, vec!["no spoilers", "stay in character"]);
        assert_eq!(core.seed_facts, vec!["likes sake", "owns a cat"]);
    }

    #[test]
    fn test_normalize_truncates_persona() {
        let mut core = sample();
        core.persona_jp = "あ".repeat(700);
        assert_eq!(normalize(&core).persona_jp.chars().count(), 600);
    }

    #[test]
    fn test_merge() {
        let delta = MergeInstruction {
            persona_jp: Some("new persona".into()),
            constraints: None,
            seed_facts: Some(vec!["a".into(), "a".into(), "b".into()]),
            edit_note: Some("rewrote".into()),
        };
        let merged = merge(&sample(), &delta);
        assert_eq!(merged.persona_jp, "new persona");
        assert_eq!(merged.constraints, sample().constraints);
        assert_eq!(merged.seed_facts, vec!["a", "b", "note:rewrote"]);
    }

    #[test]
    fn test_camel_case_wire_format() {
        let package = SoulCorePackage::new(sample());
        let json = package.to_payload().unwrap();
        assert!(json.contains("\"soulCore\""));
        assert!(json.contains("\"personaJP\""));
        assert!(json.contains("\"seedFacts\""));
        assert!(json.contains("\"ipSanitized\""));
        assert!(!json.contains("plot3d"));
    }

    #[test]
    fn test_record_edit() {
        let mut package = SoulCorePackage::new(sample());
        package.record_edit(ProvenanceKind::QrSync, None);
        let json = package.to_payload().unwrap();
        assert!(json.contains("\"type\":\"qr_sync\""));
        assert_eq!(package.provenance.unwrap().edit_log.len(), 1);
    }

    #[test]
    fn test_package_through_png() {
        let package = SoulCorePackage::new(sample());
        let png = embed_package(&TINY_PNG, &package).unwrap();
        assert_eq!(extract_package(&png).unwrap(), Some(package));
    }

    #[test]
    fn test_no_package() {
        assert_eq!(extract_package(&TINY_PNG).unwrap(), None);
    }
}
