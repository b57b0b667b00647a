//! Catalog overview assembly.

use chrono::{DateTime, Utc};
use rewardhub_core::{GroupedReward, ProviderRegistry, RewardKind, RewardStatus};
use rewardhub_db::GiftCardFilter;
use serde::Serialize;

use crate::error::CatalogError;
use crate::grouping::group_rewards;
use crate::membership::{attach_catalogs, membership_items, resolve_memberships};
use crate::store::CatalogStore;
use crate::transform::{transform_all, RawRecord, RegistryLinks, TransformContext};

/// Optional narrowing of an overview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverviewFilter {
    pub kind: Option<RewardKind>,
    /// Compared against the aggregated group status.
    pub status: Option<RewardStatus>,
    /// Case-insensitive substring of title or brand.
    pub search: Option<String>,
    /// Gift-card face value bounds, applied at the source read.
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

impl OverviewFilter {
    #[must_use]
    pub fn gift_card_filter(&self) -> GiftCardFilter {
        GiftCardFilter {
            min_value: self.min_value,
            max_value: self.max_value,
        }
    }

    /// Whether an assembled group passes the kind, status and search parts of
    /// the filter.
    #[must_use]
    pub fn matches(&self, group: &GroupedReward) -> bool {
        if self.kind.is_some_and(|k| k != group.kind) {
            return false;
        }
        if self.status.is_some_and(|s| s != group.status) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                group.title.to_lowercase().contains(&needle)
                    || group.brand.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// Result of one overview request.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogOverview {
    pub rewards: Vec<GroupedReward>,
    /// `true` when catalog memberships could not be loaded and every
    /// `catalogs` list is empty because of it.
    pub memberships_degraded: bool,
}

/// Assembles the unfiltered overview for `tenant_id` as of now.
///
/// # Errors
///
/// Returns [`CatalogError`] if a source read or registry-link read fails.
pub async fn assemble<S: CatalogStore + ?Sized>(
    store: &S,
    providers: &ProviderRegistry,
    tenant_id: i64,
) -> Result<CatalogOverview, CatalogError> {
    assemble_overview(store, providers, tenant_id, &OverviewFilter::default(), Utc::now()).await
}

/// Assembles the tenant's catalog overview.
///
/// Reads offers and gift cards, links them to the tenant's registry,
/// normalizes and groups them, then resolves catalog memberships with a
/// single bulk lookup. A failed membership lookup leaves every `catalogs`
/// list empty and sets [`CatalogOverview::memberships_degraded`].
///
/// # Errors
///
/// Returns [`CatalogError::SourceFetch`] if either source read fails and
/// [`CatalogError::RegistryLookup`] if either registry-link read fails.
pub async fn assemble_overview<S: CatalogStore + ?Sized>(
    store: &S,
    providers: &ProviderRegistry,
    tenant_id: i64,
    filter: &OverviewFilter,
    now: DateTime<Utc>,
) -> Result<CatalogOverview, CatalogError> {
    let gift_card_filter = filter.gift_card_filter();
    let (offers, gift_cards) = tokio::try_join!(
        async {
            store
                .find_offers(tenant_id)
                .await
                .map_err(|source| CatalogError::SourceFetch {
                    kind: RewardKind::Offer,
                    source,
                })
        },
        async {
            store
                .find_gift_cards(&gift_card_filter)
                .await
                .map_err(|source| CatalogError::SourceFetch {
                    kind: RewardKind::GiftCard,
                    source,
                })
        },
    )?;

    let offer_ids: Vec<i64> = offers.iter().map(|o| o.id).collect();
    let gift_card_ids: Vec<i64> = gift_cards.iter().map(|g| g.id).collect();
    let (offer_links, gift_card_links) = tokio::try_join!(
        async {
            store
                .find_registry_links(tenant_id, RewardKind::Offer, &offer_ids)
                .await
                .map_err(|source| CatalogError::RegistryLookup {
                    kind: RewardKind::Offer,
                    source,
                })
        },
        async {
            store
                .find_registry_links(tenant_id, RewardKind::GiftCard, &gift_card_ids)
                .await
                .map_err(|source| CatalogError::RegistryLookup {
                    kind: RewardKind::GiftCard,
                    source,
                })
        },
    )?;

    let mut links = RegistryLinks::new();
    links.extend(RewardKind::Offer, offer_links);
    links.extend(RewardKind::GiftCard, gift_card_links);

    let records: Vec<RawRecord> = gift_cards
        .into_iter()
        .map(RawRecord::GiftCard)
        .chain(offers.into_iter().map(RawRecord::Offer))
        .collect();
    let raw_count = records.len();

    let ctx = TransformContext {
        providers,
        links: &links,
        now,
    };
    let normalized = transform_all(&records, &ctx);
    let degraded = normalized.iter().filter(|r| r.degraded).count();

    let survivors: Vec<_> = normalized
        .into_iter()
        .filter(|r| !r.cpidx.trim().is_empty() && r.status != RewardStatus::Deleted)
        .collect();
    let dropped = raw_count - survivors.len();

    let mut groups: Vec<GroupedReward> = group_rewards(survivors)
        .into_iter()
        .filter(|g| filter.matches(g))
        .collect();

    let items = membership_items(&groups);
    let lookup = resolve_memberships(store, tenant_id, &items).await;
    attach_catalogs(&mut groups, &lookup);

    tracing::debug!(
        tenant_id,
        raw = raw_count,
        degraded,
        dropped,
        groups = groups.len(),
        memberships = lookup.len(),
        memberships_degraded = lookup.is_degraded(),
        "catalog overview assembled"
    );

    Ok(CatalogOverview {
        rewards: groups,
        memberships_degraded: lookup.is_degraded(),
    })
}

#[cfg(test)]
#[path = "overview_test.rs"]
mod tests;
