//! Groups normalized rewards into catalog entries.
//!
//! Gift cards merge by canonical CPID; offers never merge.

use std::collections::{BTreeSet, HashMap};

use rewardhub_core::{
    Availability, GroupedReward, NormalizedReward, RewardKind, RewardStatus, ValueRange,
};

use crate::identifier::is_placeholder_cpid;

/// Where a reward lands during grouping.
///
/// Raw CPIDs on degraded records are arbitrary text, so per-record keys live
/// in their own variant rather than sharing the CPID string space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Cpid(String),
    Single(RewardKind, String),
}

impl GroupKey {
    fn of(reward: &NormalizedReward) -> Self {
        match reward.kind {
            RewardKind::GiftCard
                if !reward.cpid_is_fallback && !is_placeholder_cpid(&reward.cpidx) =>
            {
                Self::Cpid(reward.cpidx.clone())
            }
            kind => Self::Single(kind, reward.source_id.clone()),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpid(cpid) => f.write_str(cpid),
            Self::Single(kind, id) => write!(f, "{kind}:{id}"),
        }
    }
}

/// Groups rewards and returns them sorted for display.
///
/// Deleted records are dropped before grouping. Within a group, members keep
/// their input order and the first one is the representative.
#[must_use]
pub fn group_rewards(rewards: Vec<NormalizedReward>) -> Vec<GroupedReward> {
    let mut order: Vec<GroupKey> = Vec::new();
    let mut members: HashMap<GroupKey, Vec<NormalizedReward>> = HashMap::new();

    for reward in rewards {
        if reward.status == RewardStatus::Deleted {
            continue;
        }
        let key = GroupKey::of(&reward);
        members
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(reward);
    }

    let mut groups: Vec<GroupedReward> = order
        .into_iter()
        .filter_map(|key| {
            let items = members.remove(&key)?;
            build_group(key.to_string(), items)
        })
        .collect();

    sort_groups(&mut groups);
    groups
}

fn build_group(key: String, items: Vec<NormalizedReward>) -> Option<GroupedReward> {
    let first = items.first()?;

    let denominations: Vec<i64> = items
        .iter()
        .map(|r| r.value)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let source_letters: Vec<String> = items
        .iter()
        .map(|r| r.source_letter.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let value_range = items
        .iter()
        .filter_map(|r| r.value_range)
        .reduce(ValueRange::span);

    Some(GroupedReward {
        key,
        cpid: first.cpid.clone(),
        cpidx: first.cpidx.clone(),
        kind: first.kind,
        title: first.title.clone(),
        brand: first.brand.clone(),
        value: first.value,
        points: first.points,
        source_count: items.len(),
        status: aggregate_status(&items),
        availability: aggregate_availability(&items),
        tags: first.tags.clone(),
        start_date: first.start_date,
        end_date: first.end_date,
        is_enabled: items.iter().any(|r| r.is_enabled),
        value_type: first.value_type,
        value_range,
        denominations,
        source_letters,
        items,
        catalogs: Vec::new(),
    })
}

/// Any active member makes the group active; all-suspended makes it
/// suspended; anything else is inactive.
#[must_use]
pub fn aggregate_status(items: &[NormalizedReward]) -> RewardStatus {
    if items.iter().any(|r| r.status == RewardStatus::Active) {
        RewardStatus::Active
    } else if !items.is_empty() && items.iter().all(|r| r.status == RewardStatus::Suspended) {
        RewardStatus::Suspended
    } else {
        RewardStatus::Inactive
    }
}

/// The members' shared availability, or `Mixed` when they disagree.
#[must_use]
pub fn aggregate_availability(items: &[NormalizedReward]) -> Availability {
    let mut iter = items.iter().map(|r| r.availability);
    let Some(first) = iter.next() else {
        return Availability::Unavailable;
    };
    if iter.all(|a| a == first) {
        first
    } else {
        Availability::Mixed
    }
}

/// Gift cards before offers, then case-insensitive title. Ties break on the
/// exact title, the group key, and the representative's source id.
pub fn sort_groups(groups: &mut [GroupedReward]) {
    groups.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| representative_id(a).cmp(representative_id(b)))
    });
}

fn representative_id(group: &GroupedReward) -> &str {
    group.items.first().map_or("", |r| r.source_id.as_str())
}
