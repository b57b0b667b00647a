//! Read queries feeding the catalog overview: raw offers, raw gift cards,
//! registry links, and enterprise catalog memberships.
//!
//! Value, points, and priority are selected as text. The catalog engine owns
//! the coercion of those loosely typed columns.

use chrono::{DateTime, Utc};
use rewardhub_core::RewardKind;
use serde_json::Value;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `offers` table.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct OfferRow {
    pub id: i64,
    pub tenant_id: i64,
    /// May be `NULL`, empty, or the `-` placeholder.
    pub cpid: Option<String>,
    pub title: Option<String>,
    pub brand_name: Option<String>,
    pub value: Option<String>,
    pub points: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// `"active"`, `"suspended"`, or `"deleted"`.
    pub status: String,
    pub language: Option<String>,
    pub tags: Vec<String>,
    pub priority: Option<String>,
    /// JSON-encoded map of size label to URL.
    pub image_urls: Option<String>,
}

/// A `gift_cards` row joined with its parent `catalog_items` row.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct GiftCardRow {
    pub id: i64,
    pub catalog_item_id: i64,
    pub provider_id: Option<i64>,
    pub cpid: Option<String>,
    pub title: Option<String>,
    pub brand_name: Option<String>,
    pub value: Option<String>,
    pub points: Option<String>,
    /// Inherited from the parent catalog item.
    pub status: String,
    /// Inherited from the parent catalog item.
    pub is_available: bool,
    pub language: Option<String>,
    pub tags: Vec<String>,
    pub priority: Option<String>,
    /// JSON-encoded map of size label to URL; may contain stray control
    /// characters from provider feeds.
    pub image_urls: Option<String>,
    /// `"fixed"` or `"variable"`; `NULL` means fixed.
    pub value_type: Option<String>,
    /// Provider-specific payload as returned by the provider's catalog API.
    pub raw_data: Option<Value>,
}

/// Link between a reward item and the tenant's registry entry for it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistryLinkRow {
    pub item_id: i64,
    pub redemption_registries_id: i64,
    pub is_active: bool,
}

/// One (item, catalog grouping) pair from the registry join.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MembershipRow {
    pub item_id: i64,
    /// `"giftcard"` or `"offer"`.
    pub item_kind: String,
    pub catalog_group_id: i64,
    pub catalog_name: Option<String>,
    pub enterprise_id: i64,
    pub enterprise_name: Option<String>,
    pub display_order: Option<i32>,
}

/// Face-value bounds applied to the gift-card read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GiftCardFilter {
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every non-deleted offer owned by the tenant.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_offers(pool: &PgPool, tenant_id: i64) -> Result<Vec<OfferRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(
        "SELECT \
             o.id, o.tenant_id, o.cpid, o.title, o.brand_name, \
             o.value::text AS value, o.points::text AS points, \
             o.start_date, o.end_date, o.status, o.language, \
             COALESCE(o.tags, '{}') AS tags, o.priority, o.image_urls \
         FROM offers o \
         WHERE o.tenant_id = $1 \
           AND o.deleted_at IS NULL \
         ORDER BY o.id",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every non-deleted gift card whose catalog item is also live,
/// optionally bounded by face value.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_gift_cards(
    pool: &PgPool,
    filter: &GiftCardFilter,
) -> Result<Vec<GiftCardRow>, DbError> {
    let rows = sqlx::query_as::<_, GiftCardRow>(
        "SELECT \
             gc.id, gc.catalog_item_id, gc.provider_id, gc.cpid, \
             COALESCE(gc.title, ci.title) AS title, \
             COALESCE(gc.brand_name, ci.brand_name) AS brand_name, \
             gc.value::text AS value, gc.points::text AS points, \
             ci.status, ci.is_available, gc.language, \
             COALESCE(gc.tags, '{}') AS tags, gc.priority, \
             COALESCE(gc.image_urls, ci.image_urls) AS image_urls, \
             gc.value_type, gc.raw_data \
         FROM gift_cards gc \
         JOIN catalog_items ci ON ci.id = gc.catalog_item_id \
         WHERE gc.deleted_at IS NULL \
           AND ci.deleted_at IS NULL \
           AND ($1::BIGINT IS NULL OR gc.value >= $1) \
           AND ($2::BIGINT IS NULL OR gc.value <= $2) \
         ORDER BY gc.id",
    )
    .bind(filter.min_value)
    .bind(filter.max_value)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the registry link for each of `item_ids` of the given kind.
///
/// Items without a link are absent from the result. When an item is linked
/// to several registry entries, an active one is preferred.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_registry_links(
    pool: &PgPool,
    tenant_id: i64,
    kind: RewardKind,
    item_ids: &[i64],
) -> Result<Vec<RegistryLinkRow>, DbError> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, RegistryLinkRow>(
        "SELECT DISTINCT ON (rr.item_id) \
             rr.item_id, rr.redemption_registries_id, reg.is_active \
         FROM registry_redemptions rr \
         JOIN redemption_registries reg ON reg.id = rr.redemption_registries_id \
         WHERE reg.tenant_id = $1 \
           AND reg.deleted_at IS NULL \
           AND rr.item_kind = $2 \
           AND rr.item_id = ANY($3) \
         ORDER BY rr.item_id, reg.is_active DESC, rr.redemption_registries_id",
    )
    .bind(tenant_id)
    .bind(kind.as_str())
    .bind(item_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the enterprise catalogs every listed gift card and offer belongs
/// to, in a single statement.
///
/// Soft-deleted catalog groupings are excluded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_catalog_memberships(
    pool: &PgPool,
    tenant_id: i64,
    gift_card_ids: &[i64],
    offer_ids: &[i64],
) -> Result<Vec<MembershipRow>, DbError> {
    let rows = sqlx::query_as::<_, MembershipRow>(
        "SELECT DISTINCT ON (rr.item_id, rr.item_kind, cg.id) \
             rr.item_id, rr.item_kind, \
             cg.id AS catalog_group_id, cg.name AS catalog_name, \
             e.id AS enterprise_id, e.name AS enterprise_name, \
             cg.display_order \
         FROM registry_redemptions rr \
         JOIN redemption_registries reg ON reg.id = rr.redemption_registries_id \
         JOIN catalog_groups cg ON cg.id = reg.catalog_group_id \
         JOIN enterprises e ON e.id = cg.enterprise_id \
         WHERE reg.tenant_id = $1 \
           AND reg.deleted_at IS NULL \
           AND cg.deleted_at IS NULL \
           AND ( \
               (rr.item_kind = 'giftcard' AND rr.item_id = ANY($2)) \
               OR (rr.item_kind = 'offer' AND rr.item_id = ANY($3)) \
           ) \
         ORDER BY rr.item_id, rr.item_kind, cg.id",
    )
    .bind(tenant_id)
    .bind(gift_card_ids)
    .bind(offer_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
