use chrono::{Duration, TimeZone, Utc};
use rewardhub_core::{
    Availability, ProviderRegistry, RewardKind, RewardStatus, ValueRange, ValueType,
    OFFER_SOURCE_LETTER, UNKNOWN_SOURCE_LETTER,
};
use serde_json::json;

use super::*;
use crate::test_support::{gift_card, link, offer, providers};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn run(record: &RawRecord, providers: &ProviderRegistry, links: &RegistryLinks) -> NormalizedReward {
    let ctx = TransformContext {
        providers,
        links,
        now: now(),
    };
    transform_record(record, &ctx)
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

#[test]
fn coerce_integer_truncates_decimals() {
    assert_eq!(coerce_integer(Some("25.99")), 25);
    assert_eq!(coerce_integer(Some(" 100 ")), 100);
    assert_eq!(coerce_integer(Some("-3.7")), -3);
}

#[test]
fn coerce_integer_defaults_to_zero() {
    assert_eq!(coerce_integer(None), 0);
    assert_eq!(coerce_integer(Some("")), 0);
    assert_eq!(coerce_integer(Some("ten dollars")), 0);
}

#[test]
fn coerce_priority_defaults_to_zero_out_of_range() {
    assert_eq!(coerce_priority(Some("7")), 7);
    assert_eq!(coerce_priority(Some("high")), 0);
    assert_eq!(coerce_priority(Some("99999999999")), 0);
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

#[test]
fn offer_gets_offer_letter_and_canonical_cpid() {
    let reward = run(
        &RawRecord::Offer(offer(7, "sbux-us-v10", "Coffee")),
        &providers(),
        &RegistryLinks::new(),
    );
    assert_eq!(reward.kind, RewardKind::Offer);
    assert_eq!(reward.source_id, "7");
    assert_eq!(reward.cpid, "sbux-us-v10");
    assert_eq!(reward.cpidx, "SBUX-US");
    assert_eq!(reward.source_letter, OFFER_SOURCE_LETTER);
    assert_eq!(reward.value, 10);
    assert_eq!(reward.points, 1000);
    assert!(!reward.degraded);
}

#[test]
fn offer_availability_follows_window() {
    let providers = providers();
    let links = RegistryLinks::new();

    let mut future = offer(1, "A", "Later");
    future.start_date = Some(now() + Duration::days(1));
    assert_eq!(
        run(&RawRecord::Offer(future), &providers, &links).availability,
        Availability::Scheduled
    );

    let mut past = offer(2, "B", "Gone");
    past.end_date = Some(now() - Duration::days(1));
    assert_eq!(
        run(&RawRecord::Offer(past), &providers, &links).availability,
        Availability::Expired
    );

    let mut open = offer(3, "C", "Now");
    open.start_date = Some(now() - Duration::days(1));
    open.end_date = Some(now() + Duration::days(1));
    assert_eq!(
        run(&RawRecord::Offer(open), &providers, &links).availability,
        Availability::Available
    );
}

#[test]
fn placeholder_cpid_falls_back_to_source_id() {
    let reward = run(
        &RawRecord::Offer(offer(42, "-", "Mystery")),
        &providers(),
        &RegistryLinks::new(),
    );
    assert_eq!(reward.cpidx, "42");
    assert!(reward.cpid_is_fallback);
}

// ---------------------------------------------------------------------------
// Gift cards
// ---------------------------------------------------------------------------

#[test]
fn gift_card_letter_from_provider_registry() {
    let mut row = gift_card(3, "AMZ", "Amazon");
    row.provider_id = Some(4);
    let reward = run(&RawRecord::GiftCard(row), &providers(), &RegistryLinks::new());
    assert_eq!(reward.source_letter, "A");
}

#[test]
fn gift_card_with_unknown_provider_gets_sentinel_and_no_range() {
    let mut row = gift_card(3, "AMZ", "Amazon");
    row.provider_id = Some(99);
    row.raw_data = Some(json!({ "denominations": [10, 20] }));
    let reward = run(&RawRecord::GiftCard(row), &providers(), &RegistryLinks::new());
    assert_eq!(reward.source_letter, UNKNOWN_SOURCE_LETTER);
    assert!(reward.value_range.is_none());
    assert!(!reward.degraded);
}

#[test]
fn gift_card_availability_from_catalog_item() {
    let mut row = gift_card(3, "AMZ", "Amazon");
    row.is_available = false;
    let reward = run(&RawRecord::GiftCard(row), &providers(), &RegistryLinks::new());
    assert_eq!(reward.availability, Availability::Unavailable);
}

#[test]
fn gift_card_decodes_provider_value_range() {
    let mut row = gift_card(3, "TNG", "Tango card");
    row.raw_data = Some(json!({ "minValue": 5, "maxValue": 200, "valueType": "VARIABLE_VALUE" }));
    let reward = run(&RawRecord::GiftCard(row), &providers(), &RegistryLinks::new());
    assert_eq!(reward.value_range, Some(ValueRange { min: 5, max: 200 }));
    assert_eq!(reward.value_type, ValueType::Variable);
}

#[test]
fn row_value_type_takes_precedence_over_payload() {
    let mut row = gift_card(3, "TNG", "Tango card");
    row.value_type = Some("fixed".to_string());
    row.raw_data = Some(json!({ "minValue": 5, "maxValue": 200, "valueType": "VARIABLE_VALUE" }));
    let reward = run(&RawRecord::GiftCard(row), &providers(), &RegistryLinks::new());
    assert_eq!(reward.value_type, ValueType::Fixed);
}

#[test]
fn gift_card_brand_falls_back_to_provider_name() {
    let mut row = gift_card(3, "BHN", "Visa");
    row.provider_id = Some(2);
    row.brand_name = None;
    let reward = run(&RawRecord::GiftCard(row), &providers(), &RegistryLinks::new());
    assert_eq!(reward.brand, "Blackhawk");
}

#[test]
fn registry_link_sets_enabled_flag() {
    let mut links = RegistryLinks::new();
    links.extend(RewardKind::GiftCard, [link(3, 900, true)]);
    let reward = run(
        &RawRecord::GiftCard(gift_card(3, "AMZ", "Amazon")),
        &providers(),
        &links,
    );
    assert_eq!(reward.registry_id.as_deref(), Some("900"));
    assert!(reward.is_enabled);

    let other_kind = run(
        &RawRecord::Offer(offer(3, "AMZ", "Amazon offer")),
        &providers(),
        &links,
    );
    assert!(other_kind.registry_id.is_none());
    assert!(!other_kind.is_enabled);
}

#[test]
fn registry_links_prefer_active_entry() {
    let mut links = RegistryLinks::new();
    links.extend(RewardKind::Offer, [link(1, 10, false), link(1, 11, true), link(1, 12, false)]);
    let chosen = links.get(RewardKind::Offer, 1).unwrap();
    assert_eq!(chosen.redemption_registries_id, 11);
    assert_eq!(links.len(), 1);
}

// ---------------------------------------------------------------------------
// Degraded path
// ---------------------------------------------------------------------------

#[test]
fn malformed_raw_data_yields_degraded_record() {
    let mut row = gift_card(5, "amz-us-m", "Amazon");
    row.raw_data = Some(json!({ "minValue": "lots" }));
    row.image_urls = Some(r#"{"large":"https://img/l.png"}"#.to_string());
    let reward = run(&RawRecord::GiftCard(row), &providers(), &RegistryLinks::new());

    assert!(reward.degraded);
    assert_eq!(reward.cpid, "amz-us-m");
    assert_eq!(reward.cpidx, "amz-us-m");
    assert!(reward.image_url.is_none());
    assert!(reward.value_range.is_none());
    assert_eq!(reward.status, RewardStatus::Active);
}

#[test]
fn unknown_status_yields_degraded_inactive_record() {
    let mut row = offer(6, "X-1", "Odd");
    row.status = "archived".to_string();
    let reward = run(&RawRecord::Offer(row), &providers(), &RegistryLinks::new());
    assert!(reward.degraded);
    assert_eq!(reward.status, RewardStatus::Inactive);
}

#[test]
fn degraded_record_without_cpid_has_empty_canonical() {
    let mut row = offer(6, "", "Odd");
    row.cpid = None;
    row.status = "bogus".to_string();
    let reward = run(&RawRecord::Offer(row), &providers(), &RegistryLinks::new());
    assert!(reward.degraded);
    assert!(reward.cpidx.is_empty());
}

#[test]
fn batch_isolates_failing_record() {
    let mut bad = gift_card(3, "BAD", "Broken");
    bad.raw_data = Some(json!("not an object"));

    let records = vec![
        RawRecord::GiftCard(gift_card(1, "A", "One")),
        RawRecord::Offer(offer(2, "B", "Two")),
        RawRecord::GiftCard(bad),
        RawRecord::Offer(offer(4, "D", "Four")),
        RawRecord::GiftCard(gift_card(5, "E", "Five")),
    ];
    let providers = providers();
    let links = RegistryLinks::new();
    let ctx = TransformContext {
        providers: &providers,
        links: &links,
        now: now(),
    };

    let out = transform_all(&records, &ctx);
    assert_eq!(out.len(), 5);
    assert!(out[2].degraded);
    assert_eq!(out[2].source_id, "3");
    assert!(out.iter().enumerate().all(|(i, r)| i == 2 || !r.degraded));
}
