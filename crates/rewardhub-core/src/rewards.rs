use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name used when a catalog grouping has no name of its own.
pub const UNTITLED_CATALOG: &str = "Untitled Catalog";

/// The two record shapes a reward can originate from. Fixed at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    /// Provider-sourced gift card. Orders before offers.
    #[serde(rename = "giftcard")]
    GiftCard,
    Offer,
}

impl RewardKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RewardKind::GiftCard => "giftcard",
            RewardKind::Offer => "offer",
        }
    }
}

impl std::fmt::Display for RewardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardStatus {
    Active,
    Suspended,
    Inactive,
    Deleted,
}

impl RewardStatus {
    /// Parses a status from the source vocabulary, ignoring case and
    /// surrounding whitespace. Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(RewardStatus::Active),
            "suspended" => Some(RewardStatus::Suspended),
            "inactive" => Some(RewardStatus::Inactive),
            "deleted" => Some(RewardStatus::Deleted),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RewardStatus::Active => "active",
            RewardStatus::Suspended => "suspended",
            RewardStatus::Inactive => "inactive",
            RewardStatus::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a reward can currently be redeemed.
///
/// `Mixed` only appears on grouped rewards whose members disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
    Scheduled,
    Expired,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Fixed,
    Variable,
}

/// Inclusive face-value bounds a provider accepts for a gift card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: i64,
    pub max: i64,
}

impl ValueRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    #[must_use]
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[must_use]
    pub fn fixed(value: i64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Smallest range covering both `self` and `other`.
    #[must_use]
    pub fn span(self, other: ValueRange) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// A single source record after identifier, image, and value normalization.
///
/// All persistence identifiers are carried as strings so the JSON output
/// never contains a wide integer type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReward {
    /// Identifier of the originating offer or gift-card row.
    pub source_id: String,
    pub kind: RewardKind,
    /// CPID as shown to users.
    pub cpid: String,
    /// Canonical CPID used as the grouping key. Never empty for records that
    /// survive assembly.
    pub cpidx: String,
    /// `true` when the record had no usable CPID and its source id was
    /// substituted.
    pub cpid_is_fallback: bool,
    pub title: String,
    pub brand: String,
    pub value: i64,
    pub points: i64,
    pub status: RewardStatus,
    pub availability: Availability,
    pub language: Option<String>,
    pub tags: Vec<String>,
    pub priority: i32,
    pub image_url: Option<String>,
    pub source_letter: String,
    pub value_type: ValueType,
    pub value_range: Option<ValueRange>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// `redemption_registries_id` of the registry entry this item links to.
    pub registry_id: Option<String>,
    /// `true` when the linked registry entry is active.
    pub is_enabled: bool,
    /// `true` when the record failed normalization and carries fallback data.
    pub degraded: bool,
}

impl NormalizedReward {
    /// Key used to look this item up in the bulk membership map,
    /// e.g. `"42-giftcard"`.
    #[must_use]
    pub fn membership_key(&self) -> String {
        membership_key(&self.source_id, self.kind)
    }
}

/// Builds the `"<identifier>-<kind>"` key shared by the membership resolver
/// and its callers.
#[must_use]
pub fn membership_key(source_id: &str, kind: RewardKind) -> String {
    format!("{source_id}-{kind}")
}

/// One enterprise catalog a reward has been placed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMembership {
    pub catalog_id: String,
    pub catalog_name: String,
    pub enterprise_id: String,
    pub enterprise_name: String,
    pub display_order: Option<i32>,
}

/// The deduplicated unit shown in the catalog overview: one gift-card brand
/// with all of its denominations, or one offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedReward {
    /// Grouping key: the canonical CPID for gift cards, or a synthetic
    /// per-record key for offers and placeholder CPIDs.
    pub key: String,
    pub cpid: String,
    pub cpidx: String,
    pub kind: RewardKind,
    pub title: String,
    pub brand: String,
    pub value: i64,
    pub points: i64,
    pub source_count: usize,
    pub status: RewardStatus,
    pub availability: Availability,
    pub tags: Vec<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_enabled: bool,
    pub value_type: ValueType,
    pub value_range: Option<ValueRange>,
    /// Sorted distinct face values across members.
    pub denominations: Vec<i64>,
    /// Sorted distinct source letters across members.
    pub source_letters: Vec<String>,
    pub items: Vec<NormalizedReward>,
    pub catalogs: Vec<CatalogMembership>,
}
