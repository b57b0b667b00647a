//! In-memory [`CatalogStore`] and row builders for engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rewardhub_core::{ProviderConfig, ProviderKind, ProviderRegistry, RewardKind};
use rewardhub_db::{
    DbError, GiftCardFilter, GiftCardRow, MembershipRow, OfferRow, RegistryLinkRow,
};

use crate::store::CatalogStore;

#[derive(Default)]
pub struct MemoryStore {
    pub offers: Vec<OfferRow>,
    pub gift_cards: Vec<GiftCardRow>,
    /// `(kind, link)` pairs; filtered by kind and id on read.
    pub links: Vec<(RewardKind, RegistryLinkRow)>,
    pub memberships: Vec<MembershipRow>,
    pub fail_offers: bool,
    pub fail_links: bool,
    pub fail_memberships: bool,
    pub membership_calls: AtomicUsize,
    pub link_calls: AtomicUsize,
    /// Filter passed to the most recent gift-card read.
    pub last_filter: Mutex<Option<GiftCardFilter>>,
}

impl MemoryStore {
    pub fn membership_calls(&self) -> usize {
        self.membership_calls.load(Ordering::SeqCst)
    }
}

fn unavailable() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_offers(&self, _tenant_id: i64) -> Result<Vec<OfferRow>, DbError> {
        if self.fail_offers {
            return Err(unavailable());
        }
        Ok(self.offers.clone())
    }

    async fn find_gift_cards(&self, filter: &GiftCardFilter) -> Result<Vec<GiftCardRow>, DbError> {
        if let Ok(mut last) = self.last_filter.lock() {
            *last = Some(*filter);
        }
        Ok(self.gift_cards.clone())
    }

    async fn find_registry_links(
        &self,
        _tenant_id: i64,
        kind: RewardKind,
        item_ids: &[i64],
    ) -> Result<Vec<RegistryLinkRow>, DbError> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_links {
            return Err(unavailable());
        }
        Ok(self
            .links
            .iter()
            .filter(|(k, row)| *k == kind && item_ids.contains(&row.item_id))
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn find_catalog_memberships(
        &self,
        _tenant_id: i64,
        gift_card_ids: &[i64],
        offer_ids: &[i64],
    ) -> Result<Vec<MembershipRow>, DbError> {
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_memberships {
            return Err(unavailable());
        }
        Ok(self
            .memberships
            .iter()
            .filter(|row| match row.item_kind.as_str() {
                "giftcard" => gift_card_ids.contains(&row.item_id),
                "offer" => offer_ids.contains(&row.item_id),
                _ => false,
            })
            .cloned()
            .collect())
    }
}

pub fn providers() -> ProviderRegistry {
    ProviderRegistry::new(vec![
        ProviderConfig {
            id: 1,
            name: "Tango".to_string(),
            kind: ProviderKind::Tango,
            letter: "T".to_string(),
        },
        ProviderConfig {
            id: 2,
            name: "Blackhawk".to_string(),
            kind: ProviderKind::Blackhawk,
            letter: "B".to_string(),
        },
        ProviderConfig {
            id: 4,
            name: "Amazon".to_string(),
            kind: ProviderKind::Amazon,
            letter: "A".to_string(),
        },
    ])
    .expect("test providers are valid")
}

pub fn offer(id: i64, cpid: &str, title: &str) -> OfferRow {
    OfferRow {
        id,
        tenant_id: 1,
        cpid: Some(cpid.to_string()),
        title: Some(title.to_string()),
        brand_name: Some("Acme".to_string()),
        value: Some("10".to_string()),
        points: Some("1000".to_string()),
        status: "active".to_string(),
        ..OfferRow::default()
    }
}

pub fn gift_card(id: i64, cpid: &str, title: &str) -> GiftCardRow {
    GiftCardRow {
        id,
        catalog_item_id: id * 100,
        provider_id: Some(1),
        cpid: Some(cpid.to_string()),
        title: Some(title.to_string()),
        brand_name: Some("Acme".to_string()),
        value: Some("25".to_string()),
        points: Some("2500".to_string()),
        status: "active".to_string(),
        is_available: true,
        ..GiftCardRow::default()
    }
}

pub fn link(item_id: i64, registry_id: i64, is_active: bool) -> RegistryLinkRow {
    RegistryLinkRow {
        item_id,
        redemption_registries_id: registry_id,
        is_active,
    }
}

pub fn membership(
    item_id: i64,
    kind: RewardKind,
    catalog: (i64, Option<&str>),
    enterprise: (i64, &str),
) -> MembershipRow {
    MembershipRow {
        item_id,
        item_kind: kind.as_str().to_string(),
        catalog_group_id: catalog.0,
        catalog_name: catalog.1.map(str::to_string),
        enterprise_id: enterprise.0,
        enterprise_name: Some(enterprise.1.to_string()),
        display_order: None,
    }
}
