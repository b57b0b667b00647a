//! Bulk catalog-membership lookup.
//!
//! One persistence call per overview, however many groups or items it holds.

use std::collections::{BTreeSet, HashMap, HashSet};

use rewardhub_core::{
    membership_key, CatalogMembership, GroupedReward, RewardKind, UNTITLED_CATALOG,
};
use rewardhub_db::MembershipRow;

use crate::store::CatalogStore;

/// One item to resolve memberships for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MembershipItem {
    pub source_id: String,
    pub kind: RewardKind,
}

/// Memberships keyed by `"<identifier>-<kind>"`.
#[derive(Debug, Clone, Default)]
pub struct MembershipLookup {
    by_key: HashMap<String, Vec<CatalogMembership>>,
    degraded: bool,
}

impl MembershipLookup {
    fn failed() -> Self {
        Self {
            by_key: HashMap::new(),
            degraded: true,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> &[CatalogMembership] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// `true` when the lookup failed and the map is empty because of it
    /// rather than because nothing matched.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Number of items with at least one membership.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Every member item of every group, flattened.
#[must_use]
pub fn membership_items(groups: &[GroupedReward]) -> Vec<MembershipItem> {
    groups
        .iter()
        .flat_map(|g| &g.items)
        .map(|item| MembershipItem {
            source_id: item.source_id.clone(),
            kind: item.kind,
        })
        .collect()
}

/// Resolves catalog memberships for `items` with a single store call.
///
/// Failure never propagates: a store error is logged and yields an empty,
/// degraded lookup.
pub async fn resolve_memberships<S: CatalogStore + ?Sized>(
    store: &S,
    tenant_id: i64,
    items: &[MembershipItem],
) -> MembershipLookup {
    let mut gift_card_ids = BTreeSet::new();
    let mut offer_ids = BTreeSet::new();
    for item in items {
        let Ok(id) = item.source_id.parse::<i64>() else {
            tracing::debug!(source_id = %item.source_id, "non-numeric item id skipped for membership lookup");
            continue;
        };
        match item.kind {
            RewardKind::GiftCard => gift_card_ids.insert(id),
            RewardKind::Offer => offer_ids.insert(id),
        };
    }

    if gift_card_ids.is_empty() && offer_ids.is_empty() {
        return MembershipLookup::default();
    }

    let gift_card_ids: Vec<i64> = gift_card_ids.into_iter().collect();
    let offer_ids: Vec<i64> = offer_ids.into_iter().collect();

    match store
        .find_catalog_memberships(tenant_id, &gift_card_ids, &offer_ids)
        .await
    {
        Ok(rows) => build_lookup(rows),
        Err(e) => {
            tracing::error!(
                tenant_id,
                gift_cards = gift_card_ids.len(),
                offers = offer_ids.len(),
                error = %e,
                "catalog membership lookup failed; returning no memberships"
            );
            MembershipLookup::failed()
        }
    }
}

fn build_lookup(rows: Vec<MembershipRow>) -> MembershipLookup {
    let mut seen: HashSet<(i64, String, i64)> = HashSet::new();
    let mut by_key: HashMap<String, Vec<CatalogMembership>> = HashMap::new();

    for row in rows {
        if !seen.insert((row.item_id, row.item_kind.clone(), row.catalog_group_id)) {
            continue;
        }
        let Some(kind) = parse_kind(&row.item_kind) else {
            tracing::warn!(item_kind = %row.item_kind, "membership row with unknown item kind");
            continue;
        };

        let membership = CatalogMembership {
            catalog_id: row.catalog_group_id.to_string(),
            catalog_name: row
                .catalog_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNTITLED_CATALOG.to_string()),
            enterprise_id: row.enterprise_id.to_string(),
            enterprise_name: row.enterprise_name.unwrap_or_default(),
            display_order: row.display_order,
        };
        by_key
            .entry(membership_key(&row.item_id.to_string(), kind))
            .or_default()
            .push(membership);
    }

    MembershipLookup {
        by_key,
        degraded: false,
    }
}

fn parse_kind(raw: &str) -> Option<RewardKind> {
    match raw {
        "giftcard" => Some(RewardKind::GiftCard),
        "offer" => Some(RewardKind::Offer),
        _ => None,
    }
}

/// Fills each group's `catalogs` from its members' memberships.
///
/// A catalog reached through several members appears once. The result is
/// ordered by enterprise name, then catalog name, then catalog id.
pub fn attach_catalogs(groups: &mut [GroupedReward], lookup: &MembershipLookup) {
    for group in groups {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut catalogs: Vec<CatalogMembership> = Vec::new();

        for item in &group.items {
            for membership in lookup.get(&item.membership_key()) {
                let pair = (
                    membership.catalog_id.clone(),
                    membership.enterprise_id.clone(),
                );
                if seen.insert(pair) {
                    catalogs.push(membership.clone());
                }
            }
        }

        catalogs.sort_by(|a, b| {
            a.enterprise_name
                .cmp(&b.enterprise_name)
                .then_with(|| a.catalog_name.cmp(&b.catalog_name))
                .then_with(|| a.catalog_id.cmp(&b.catalog_id))
        });
        group.catalogs = catalogs;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::test_support::{membership, MemoryStore};

    fn item(id: &str, kind: RewardKind) -> MembershipItem {
        MembershipItem {
            source_id: id.to_string(),
            kind,
        }
    }

    #[tokio::test]
    async fn resolves_both_kinds_in_one_call() {
        let store = MemoryStore {
            memberships: vec![
                membership(1, RewardKind::GiftCard, (10, Some("Holiday")), (100, "Globex")),
                membership(1, RewardKind::Offer, (11, Some("Perks")), (100, "Globex")),
            ],
            ..MemoryStore::default()
        };
        let lookup = resolve_memberships(
            &store,
            1,
            &[item("1", RewardKind::GiftCard), item("1", RewardKind::Offer)],
        )
        .await;

        assert_eq!(store.membership_calls(), 1);
        assert!(!lookup.is_degraded());
        assert_eq!(lookup.get("1-giftcard")[0].catalog_name, "Holiday");
        assert_eq!(lookup.get("1-offer")[0].catalog_name, "Perks");
    }

    #[tokio::test]
    async fn no_items_means_no_call() {
        let store = MemoryStore::default();
        let lookup = resolve_memberships(&store, 1, &[]).await;
        assert_eq!(store.membership_calls.load(Ordering::SeqCst), 0);
        assert!(lookup.is_empty());
    }

    #[tokio::test]
    async fn failure_returns_empty_degraded_lookup() {
        let store = MemoryStore {
            fail_memberships: true,
            ..MemoryStore::default()
        };
        let lookup = resolve_memberships(&store, 1, &[item("1", RewardKind::GiftCard)]).await;
        assert!(lookup.is_empty());
        assert!(lookup.is_degraded());
        assert!(lookup.get("1-giftcard").is_empty());
    }

    #[test]
    fn duplicate_rows_are_collapsed_and_names_defaulted() {
        let lookup = build_lookup(vec![
            membership(5, RewardKind::GiftCard, (10, None), (100, "Globex")),
            membership(5, RewardKind::GiftCard, (10, None), (100, "Globex")),
            membership(5, RewardKind::GiftCard, (12, Some("  ")), (100, "Globex")),
        ]);
        let catalogs = lookup.get("5-giftcard");
        assert_eq!(catalogs.len(), 2);
        assert!(catalogs.iter().all(|c| c.catalog_name == UNTITLED_CATALOG));
    }

    #[test]
    fn attach_dedups_across_members_and_sorts_by_enterprise() {
        let lookup = build_lookup(vec![
            membership(1, RewardKind::GiftCard, (10, Some("Holiday")), (200, "Zenith")),
            membership(2, RewardKind::GiftCard, (10, Some("Holiday")), (200, "Zenith")),
            membership(3, RewardKind::GiftCard, (10, Some("Holiday")), (200, "Zenith")),
            membership(2, RewardKind::GiftCard, (20, Some("Staff")), (100, "Acme")),
        ]);

        let mut group = crate::grouping::group_rewards(
            ["1", "2", "3"]
                .into_iter()
                .map(grouped_member)
                .collect(),
        );
        assert_eq!(group.len(), 1);
        attach_catalogs(&mut group, &lookup);

        let names: Vec<&str> = group[0]
            .catalogs
            .iter()
            .map(|c| c.enterprise_name.as_str())
            .collect();
        assert_eq!(names, vec!["Acme", "Zenith"]);
    }

    fn grouped_member(id: &str) -> rewardhub_core::NormalizedReward {
        rewardhub_core::NormalizedReward {
            source_id: id.to_string(),
            kind: RewardKind::GiftCard,
            cpid: "AMZ".to_string(),
            cpidx: "AMZ".to_string(),
            cpid_is_fallback: false,
            title: "Amazon".to_string(),
            brand: "Amazon".to_string(),
            value: 25,
            points: 0,
            status: rewardhub_core::RewardStatus::Active,
            availability: rewardhub_core::Availability::Available,
            language: None,
            tags: Vec::new(),
            priority: 0,
            image_url: None,
            source_letter: "A".to_string(),
            value_type: rewardhub_core::ValueType::Fixed,
            value_range: None,
            start_date: None,
            end_date: None,
            registry_id: None,
            is_enabled: false,
            degraded: false,
        }
    }
}
