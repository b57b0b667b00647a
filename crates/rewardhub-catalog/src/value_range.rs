//! Per-provider decoding of gift-card `raw_data` payloads.
//!
//! Each [`ProviderKind`] has exactly one decoder. Adding a provider kind
//! without a decoder fails to compile at [`decode_payload`].

use rewardhub_core::{ProviderKind, ValueRange, ValueType};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TangoPayload {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// `"FIXED_VALUE"` or `"VARIABLE_VALUE"`.
    pub value_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackhawkPayload {
    pub product_value: Option<Bounds>,
    pub fixed_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TremendousPayload {
    #[serde(default)]
    pub skus: Vec<Bounds>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AmazonPayload {
    #[serde(default)]
    pub denominations: Vec<f64>,
}

/// A gift card's provider payload, decoded according to its provider kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderPayload {
    Tango(TangoPayload),
    Blackhawk(BlackhawkPayload),
    Tremendous(TremendousPayload),
    Amazon(AmazonPayload),
}

/// Decodes `raw` with the decoder for `kind`.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if the payload does not match the
/// provider's shape.
pub fn decode_payload(kind: ProviderKind, raw: &Value) -> Result<ProviderPayload, serde_json::Error> {
    let payload = match kind {
        ProviderKind::Tango => ProviderPayload::Tango(TangoPayload::deserialize(raw)?),
        ProviderKind::Blackhawk => ProviderPayload::Blackhawk(BlackhawkPayload::deserialize(raw)?),
        ProviderKind::Tremendous => {
            ProviderPayload::Tremendous(TremendousPayload::deserialize(raw)?)
        }
        ProviderKind::Amazon => ProviderPayload::Amazon(AmazonPayload::deserialize(raw)?),
    };
    Ok(payload)
}

impl ProviderPayload {
    /// Face-value bounds the provider accepts, if the payload states them.
    #[must_use]
    pub fn value_range(&self) -> Option<ValueRange> {
        match self {
            ProviderPayload::Tango(p) => match (p.min_value, p.max_value) {
                (Some(min), Some(max)) => Some(ValueRange::new(whole(min), whole(max))),
                (Some(v), None) | (None, Some(v)) => Some(ValueRange::fixed(whole(v))),
                (None, None) => None,
            },
            ProviderPayload::Blackhawk(p) => p
                .product_value
                .as_ref()
                .map(|b| ValueRange::new(whole(b.min), whole(b.max)))
                .or_else(|| p.fixed_value.map(|v| ValueRange::fixed(whole(v)))),
            ProviderPayload::Tremendous(p) => p
                .skus
                .iter()
                .map(|b| ValueRange::new(whole(b.min), whole(b.max)))
                .reduce(ValueRange::span),
            ProviderPayload::Amazon(p) => p
                .denominations
                .iter()
                .map(|v| ValueRange::fixed(whole(*v)))
                .reduce(ValueRange::span),
        }
    }

    /// Fixed vs. variable pricing as implied by the payload.
    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        if let ProviderPayload::Tango(TangoPayload {
            value_type: Some(raw),
            ..
        }) = self
        {
            return Some(if raw.eq_ignore_ascii_case("VARIABLE_VALUE") {
                ValueType::Variable
            } else {
                ValueType::Fixed
            });
        }

        self.value_range().map(|range| {
            if range.min == range.max {
                ValueType::Fixed
            } else {
                ValueType::Variable
            }
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn whole(amount: f64) -> i64 {
    if amount.is_finite() {
        amount.trunc() as i64
    } else {
        0
    }
}
