//! CPID canonicalization and image payload resolution.
//!
//! Neither function in this module fails: malformed input degrades to the
//! raw CPID or to an absent image.

use rewardhub_core::RewardKind;
use serde_json::Value;

use crate::error::{CpidError, ImageParseError};

/// Literal the sources use for "no real identifier".
pub const PLACEHOLDER_CPID: &str = "-";

const MAX_CPID_LEN: usize = 128;

/// Size labels tried in order before falling back to any other entry.
const IMAGE_SIZE_PREFERENCE: [&str; 4] = ["large", "medium", "original", "small"];

/// Returns `true` when `cpid` is the degenerate placeholder rather than a
/// real catalog product identifier.
///
/// A product legitimately named `-` is misclassified here. The check lives
/// in one place so that trade-off stays visible.
#[must_use]
pub fn is_placeholder_cpid(cpid: &str) -> bool {
    cpid.trim() == PLACEHOLDER_CPID
}

/// Display and canonical forms of a record's CPID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpidPair {
    pub display: String,
    pub canonical: String,
    /// `true` when the raw identifier was substituted for a missing CPID.
    pub is_fallback: bool,
}

/// Produces the display and canonical CPID for a raw record.
///
/// A missing, empty, or placeholder CPID falls back to `raw_id` for both
/// forms. The canonical form is empty only when `raw_id` is empty too, in
/// which case the caller must drop the record.
#[must_use]
pub fn normalize_cpid(raw_cpid: Option<&str>, raw_id: &str) -> CpidPair {
    let usable = raw_cpid.filter(|c| !c.trim().is_empty() && !is_placeholder_cpid(c));

    let Some(cpid) = usable else {
        let id = raw_id.trim().to_string();
        return CpidPair {
            display: id.clone(),
            canonical: id,
            is_fallback: true,
        };
    };

    match canonical_cpid(cpid) {
        Ok(canonical) => CpidPair {
            display: cpid.to_string(),
            canonical,
            is_fallback: false,
        },
        Err(e) => {
            tracing::warn!(cpid, raw_id, error = %e, "cpid normalization failed; using raw value");
            CpidPair {
                display: cpid.to_string(),
                canonical: cpid.to_string(),
                is_fallback: false,
            }
        }
    }
}

/// Canonicalizes a CPID: trims, uppercases, and strips trailing master
/// (`-M`) and variant (`-V<digits>`) suffixes.
///
/// Idempotent: a canonical CPID maps to itself.
///
/// # Errors
///
/// Returns [`CpidError`] if the CPID is empty, too long, or contains
/// control characters.
pub fn canonical_cpid(cpid: &str) -> Result<String, CpidError> {
    let trimmed = cpid.trim();
    if trimmed.is_empty() {
        return Err(CpidError::Empty);
    }

    let len = trimmed.chars().count();
    if len > MAX_CPID_LEN {
        return Err(CpidError::TooLong {
            len,
            max: MAX_CPID_LEN,
        });
    }

    if trimmed.chars().any(char::is_control) {
        return Err(CpidError::ControlCharacter);
    }

    let mut canonical = trimmed.to_uppercase();
    while let Some(head) = strip_variant_suffix(&canonical) {
        canonical = head.to_string();
    }
    Ok(canonical)
}

fn strip_variant_suffix(cpid: &str) -> Option<&str> {
    let (head, tail) = cpid.rsplit_once('-')?;
    if head.is_empty() {
        return None;
    }

    let is_master = tail == "M";
    let is_variant = tail
        .strip_prefix('V')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));

    (is_master || is_variant).then_some(head)
}

/// Resolves a raw image payload into one display URL.
///
/// Gift-card payloads have control characters stripped before parsing.
/// Returns `None` when the payload is missing or unusable.
#[must_use]
pub fn resolve_image_url(payload: Option<&str>, kind: RewardKind) -> Option<String> {
    let payload = payload?;
    match parse_image_payload(payload, kind == RewardKind::GiftCard) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!(kind = %kind, error = %e, "image payload ignored");
            None
        }
    }
}

fn parse_image_payload(payload: &str, strip_control: bool) -> Result<String, ImageParseError> {
    let cleaned: String = if strip_control {
        payload.chars().filter(|c| !c.is_control()).collect()
    } else {
        payload.to_string()
    };
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(ImageParseError::Empty);
    }

    if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
        return Ok(cleaned.to_string());
    }

    let map = match serde_json::from_str::<Value>(cleaned)? {
        Value::Object(map) => map,
        Value::String(url) if !url.trim().is_empty() => return Ok(url.trim().to_string()),
        _ => return Err(ImageParseError::NoUrl),
    };

    let url_for = |label: &str| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(label))
            .and_then(|(_, v)| non_empty_str(v))
    };

    IMAGE_SIZE_PREFERENCE
        .iter()
        .find_map(|label| url_for(*label))
        .or_else(|| map.values().find_map(non_empty_str))
        .map(str::to_string)
        .ok_or(ImageParseError::NoUrl)
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}
