//! Catalog reconciliation engine.
//!
//! Merges offers and provider gift cards into one deduplicated, tenant-scoped
//! overview annotated with the enterprise catalogs each reward belongs to.

pub mod error;
pub mod grouping;
pub mod identifier;
pub mod membership;
pub mod overview;
pub mod source_letter;
pub mod store;
pub mod transform;
pub mod value_range;

#[cfg(test)]
mod test_support;

pub use error::{CatalogError, CpidError, ImageParseError, TransformError};
pub use grouping::{aggregate_availability, aggregate_status, group_rewards, sort_groups};
pub use identifier::{is_placeholder_cpid, normalize_cpid, resolve_image_url, CpidPair};
pub use membership::{attach_catalogs, resolve_memberships, MembershipItem, MembershipLookup};
pub use overview::{assemble, assemble_overview, CatalogOverview, OverviewFilter};
pub use source_letter::{resolve_source_letter, ProviderLetters};
pub use store::{CatalogStore, PgCatalogStore};
pub use transform::{transform_all, transform_record, RawRecord, RegistryLinks, TransformContext};
