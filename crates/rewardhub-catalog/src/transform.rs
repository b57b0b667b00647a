//! Raw source record → [`NormalizedReward`].
//!
//! Every record produces exactly one output. A record that fails
//! normalization comes back degraded rather than aborting the batch.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rewardhub_core::{
    Availability, NormalizedReward, ProviderRegistry, RewardKind, RewardStatus, ValueRange,
    ValueType,
};
use rewardhub_db::{GiftCardRow, OfferRow, RegistryLinkRow};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::TransformError;
use crate::identifier::{normalize_cpid, resolve_image_url};
use crate::source_letter::resolve_source_letter;
use crate::value_range::decode_payload;

/// One record as read from persistence.
#[derive(Debug, Clone)]
pub enum RawRecord {
    Offer(OfferRow),
    GiftCard(GiftCardRow),
}

impl RawRecord {
    #[must_use]
    pub fn kind(&self) -> RewardKind {
        match self {
            RawRecord::Offer(_) => RewardKind::Offer,
            RawRecord::GiftCard(_) => RewardKind::GiftCard,
        }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            RawRecord::Offer(row) => row.id,
            RawRecord::GiftCard(row) => row.id,
        }
    }

    fn raw_cpid(&self) -> Option<&str> {
        match self {
            RawRecord::Offer(row) => row.cpid.as_deref(),
            RawRecord::GiftCard(row) => row.cpid.as_deref(),
        }
    }

    fn raw_status(&self) -> &str {
        match self {
            RawRecord::Offer(row) => &row.status,
            RawRecord::GiftCard(row) => &row.status,
        }
    }
}

/// Registry links for a batch, keyed by item kind and identifier.
#[derive(Debug, Clone, Default)]
pub struct RegistryLinks {
    by_item: HashMap<(RewardKind, i64), RegistryLinkRow>,
}

impl RegistryLinks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the links read for one item kind. A later link for the same item
    /// only replaces an earlier one when it is active and the earlier one is
    /// not.
    pub fn extend(&mut self, kind: RewardKind, rows: impl IntoIterator<Item = RegistryLinkRow>) {
        for row in rows {
            let key = (kind, row.item_id);
            match self.by_item.get(&key) {
                Some(existing) if existing.is_active || !row.is_active => {}
                _ => {
                    self.by_item.insert(key, row);
                }
            }
        }
    }

    #[must_use]
    pub fn get(&self, kind: RewardKind, item_id: i64) -> Option<&RegistryLinkRow> {
        self.by_item.get(&(kind, item_id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_item.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }
}

/// Shared inputs for transforming one batch.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub providers: &'a ProviderRegistry,
    pub links: &'a RegistryLinks,
    /// Reference time for offer availability windows.
    pub now: DateTime<Utc>,
}

/// Transforms a whole batch, one output per input, in input order.
#[must_use]
pub fn transform_all(records: &[RawRecord], ctx: &TransformContext<'_>) -> Vec<NormalizedReward> {
    records.iter().map(|r| transform_record(r, ctx)).collect()
}

/// Transforms one record. Never fails: a record that cannot be normalized
/// is logged and returned in degraded form.
#[must_use]
pub fn transform_record(record: &RawRecord, ctx: &TransformContext<'_>) -> NormalizedReward {
    match try_transform(record, ctx) {
        Ok(reward) => reward,
        Err(e) => {
            tracing::warn!(
                source_id = record.id(),
                kind = %record.kind(),
                error = %e,
                "record transform failed; emitting degraded record"
            );
            degraded(record, ctx)
        }
    }
}

fn try_transform(
    record: &RawRecord,
    ctx: &TransformContext<'_>,
) -> Result<NormalizedReward, TransformError> {
    let status = RewardStatus::parse(record.raw_status())
        .ok_or_else(|| TransformError::UnknownStatus(record.raw_status().to_string()))?;

    let source_id = record.id().to_string();
    let cpid = normalize_cpid(record.raw_cpid(), &source_id);
    let mut reward = base(record, ctx, status);
    reward.cpid = cpid.display;
    reward.cpidx = cpid.canonical;
    reward.cpid_is_fallback = cpid.is_fallback;
    reward.image_url = resolve_image_url(image_payload(record), record.kind());

    if let RawRecord::GiftCard(row) = record {
        let payload = match (row.provider_id.and_then(|id| ctx.providers.kind_of(id)), &row.raw_data) {
            (Some(provider), Some(raw)) if !raw.is_null() => Some(
                decode_payload(provider, raw)
                    .map_err(|source| TransformError::RawData { provider, source })?,
            ),
            _ => None,
        };
        if let Some(payload) = payload {
            reward.value_range = payload.value_range();
            if row.value_type.as_deref().and_then(parse_value_type).is_none() {
                if let Some(value_type) = payload.value_type() {
                    reward.value_type = value_type;
                }
            }
        }
    }

    Ok(reward)
}

/// Fallback output for a record that failed normalization: raw CPID for both
/// forms, no image, no value range.
fn degraded(record: &RawRecord, ctx: &TransformContext<'_>) -> NormalizedReward {
    let status = RewardStatus::parse(record.raw_status()).unwrap_or(RewardStatus::Inactive);
    let raw_cpid = record.raw_cpid().unwrap_or_default().to_string();

    let mut reward = base(record, ctx, status);
    reward.cpid.clone_from(&raw_cpid);
    reward.cpidx = raw_cpid;
    reward.degraded = true;
    reward
}

/// Fields that cannot fail to normalize. CPID, image, and value range are
/// left empty for the caller to fill in.
fn base(record: &RawRecord, ctx: &TransformContext<'_>, status: RewardStatus) -> NormalizedReward {
    let kind = record.kind();
    let link = ctx.links.get(kind, record.id());
    let registry_id = link.map(|l| l.redemption_registries_id.to_string());
    let is_enabled = link.is_some_and(|l| l.is_active);

    match record {
        RawRecord::Offer(row) => NormalizedReward {
            source_id: row.id.to_string(),
            kind,
            cpid: String::new(),
            cpidx: String::new(),
            cpid_is_fallback: false,
            title: text_or_empty(row.title.as_deref()),
            brand: text_or_empty(row.brand_name.as_deref()),
            value: coerce_integer(row.value.as_deref()),
            points: coerce_integer(row.points.as_deref()),
            status,
            availability: offer_availability(row.start_date, row.end_date, ctx.now),
            language: row.language.clone(),
            tags: row.tags.clone(),
            priority: coerce_priority(row.priority.as_deref()),
            image_url: None,
            source_letter: resolve_source_letter(kind, None, ctx.providers),
            value_type: ValueType::Fixed,
            value_range: None,
            start_date: row.start_date,
            end_date: row.end_date,
            registry_id,
            is_enabled,
            degraded: false,
        },
        RawRecord::GiftCard(row) => {
            let brand = row
                .brand_name
                .as_deref()
                .filter(|b| !b.trim().is_empty())
                .map(|b| b.trim().to_string())
                .or_else(|| {
                    row.provider_id
                        .and_then(|id| ctx.providers.get(id))
                        .map(|p| p.name.clone())
                })
                .unwrap_or_default();

            NormalizedReward {
                source_id: row.id.to_string(),
                kind,
                cpid: String::new(),
                cpidx: String::new(),
                cpid_is_fallback: false,
                title: text_or_empty(row.title.as_deref()),
                brand,
                value: coerce_integer(row.value.as_deref()),
                points: coerce_integer(row.points.as_deref()),
                status,
                availability: if row.is_available {
                    Availability::Available
                } else {
                    Availability::Unavailable
                },
                language: row.language.clone(),
                tags: row.tags.clone(),
                priority: coerce_priority(row.priority.as_deref()),
                image_url: None,
                source_letter: resolve_source_letter(kind, row.provider_id, ctx.providers),
                value_type: row
                    .value_type
                    .as_deref()
                    .and_then(parse_value_type)
                    .unwrap_or(ValueType::Fixed),
                value_range: None,
                start_date: None,
                end_date: None,
                registry_id,
                is_enabled,
                degraded: false,
            }
        }
    }
}

fn image_payload(record: &RawRecord) -> Option<&str> {
    match record {
        RawRecord::Offer(row) => row.image_urls.as_deref(),
        RawRecord::GiftCard(row) => row.image_urls.as_deref(),
    }
}

fn text_or_empty(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or_default().to_string()
}

fn parse_value_type(raw: &str) -> Option<ValueType> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "fixed" | "fixed_value" => Some(ValueType::Fixed),
        "variable" | "variable_value" => Some(ValueType::Variable),
        _ => None,
    }
}

fn parse_decimal(raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Parses a loosely typed numeric column, truncating toward zero. Anything
/// unparsable or out of range becomes 0.
#[must_use]
pub fn coerce_integer(raw: Option<&str>) -> i64 {
    parse_decimal(raw)
        .and_then(|d| d.trunc().to_i64())
        .unwrap_or(0)
}

/// Like [`coerce_integer`] but for the 32-bit priority column.
#[must_use]
pub fn coerce_priority(raw: Option<&str>) -> i32 {
    parse_decimal(raw)
        .and_then(|d| d.trunc().to_i32())
        .unwrap_or(0)
}

fn offer_availability(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Availability {
    if start.is_some_and(|s| now < s) {
        Availability::Scheduled
    } else if end.is_some_and(|e| now > e) {
        Availability::Expired
    } else {
        Availability::Available
    }
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;
