use rewardhub_core::{ProviderRegistry, RewardKind, OFFER_SOURCE_LETTER, UNKNOWN_SOURCE_LETTER};

/// Provider-to-letter lookup.
pub trait ProviderLetters {
    /// Returns the letter for `provider_id`, or an "unknown" sentinel when the
    /// provider is not known. Never fails.
    fn letter_for_provider(&self, provider_id: i64) -> String;
}

impl ProviderLetters for ProviderRegistry {
    fn letter_for_provider(&self, provider_id: i64) -> String {
        self.letter_for(provider_id).to_string()
    }
}

/// Resolves the single-letter source code for a record.
///
/// Offers always get [`OFFER_SOURCE_LETTER`]. Gift cards get whatever the
/// lookup returns, except that the offer letter is never handed to a gift
/// card.
#[must_use]
pub fn resolve_source_letter<L: ProviderLetters + ?Sized>(
    kind: RewardKind,
    provider_id: Option<i64>,
    lookup: &L,
) -> String {
    match kind {
        RewardKind::Offer => OFFER_SOURCE_LETTER.to_string(),
        RewardKind::GiftCard => {
            let Some(provider_id) = provider_id else {
                return UNKNOWN_SOURCE_LETTER.to_string();
            };
            let letter = lookup.letter_for_provider(provider_id);
            if letter == OFFER_SOURCE_LETTER {
                tracing::warn!(provider_id, "provider resolved to the offer letter");
                return UNKNOWN_SOURCE_LETTER.to_string();
            }
            letter
        }
    }
}
