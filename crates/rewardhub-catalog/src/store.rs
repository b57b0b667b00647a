use async_trait::async_trait;
use rewardhub_core::RewardKind;
use rewardhub_db::{
    DbError, GiftCardFilter, GiftCardRow, MembershipRow, OfferRow, RegistryLinkRow,
};
use sqlx::PgPool;

/// Read access the overview engine needs from persistence.
///
/// Every method is a single bounded read. Retries and timeouts belong to the
/// implementation's connection pool.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_offers(&self, tenant_id: i64) -> Result<Vec<OfferRow>, DbError>;

    async fn find_gift_cards(&self, filter: &GiftCardFilter) -> Result<Vec<GiftCardRow>, DbError>;

    async fn find_registry_links(
        &self,
        tenant_id: i64,
        kind: RewardKind,
        item_ids: &[i64],
    ) -> Result<Vec<RegistryLinkRow>, DbError>;

    /// Membership rows for both item kinds in one round trip.
    async fn find_catalog_memberships(
        &self,
        tenant_id: i64,
        gift_card_ids: &[i64],
        offer_ids: &[i64],
    ) -> Result<Vec<MembershipRow>, DbError>;
}

/// [`CatalogStore`] backed by the Postgres read model.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_offers(&self, tenant_id: i64) -> Result<Vec<OfferRow>, DbError> {
        rewardhub_db::find_offers(&self.pool, tenant_id).await
    }

    async fn find_gift_cards(&self, filter: &GiftCardFilter) -> Result<Vec<GiftCardRow>, DbError> {
        rewardhub_db::find_gift_cards(&self.pool, filter).await
    }

    async fn find_registry_links(
        &self,
        tenant_id: i64,
        kind: RewardKind,
        item_ids: &[i64],
    ) -> Result<Vec<RegistryLinkRow>, DbError> {
        rewardhub_db::find_registry_links(&self.pool, tenant_id, kind, item_ids).await
    }

    async fn find_catalog_memberships(
        &self,
        tenant_id: i64,
        gift_card_ids: &[i64],
        offer_ids: &[i64],
    ) -> Result<Vec<MembershipRow>, DbError> {
        rewardhub_db::find_catalog_memberships(&self.pool, tenant_id, gift_card_ids, offer_ids)
            .await
    }
}
