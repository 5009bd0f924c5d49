use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identity of a booking: the store it belongs to plus the
/// platform's record id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookingId {
    pub store_id: String,
    pub booking_id: String,
}

impl BookingId {
    pub fn new(store_id: impl Into<String>, booking_id: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            booking_id: booking_id.into(),
        }
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.store_id, self.booking_id)
    }
}

/// A booking as fetched from the reservation platform for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(flatten)]
    pub id: BookingId,
    /// Start of the booked slot, in the store's local offset.
    pub scheduled_at: DateTime<FixedOffset>,
    /// Platform status code, compared verbatim.
    #[serde(default)]
    pub status: String,
    /// Free text holding the options the customer selected.
    #[serde(default)]
    pub option_text: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Store-specific metadata and values computed by the caller.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Booking {
    /// Phone number with everything except the last four digits masked.
    pub fn phone_masked(&self) -> Option<String> {
        self.phone.as_deref().map(mask_phone)
    }
}

/// Mask all but the last four digits of a phone number, keeping separators.
pub fn mask_phone(phone: &str) -> String {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let keep_from = digits.saturating_sub(4);
    let mut seen = 0;
    phone
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen <= keep_from {
                    return '*';
                }
            }
            c
        })
        .collect()
}

/// Named idempotency flags of a record.
///
/// Flags only ever move from `false` to `true`; there is no way to clear one
/// through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(BTreeMap<String, bool>);

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the flag is currently true. Absent flags read as false.
    pub fn is_set(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    /// Mark a flag as true. Returns whether it was previously unset.
    pub fn mark(&mut self, name: impl Into<String>) -> bool {
        let previous = self.0.insert(name.into(), true);
        previous != Some(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FlagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut flags = FlagSet::new();
        for name in iter {
            flags.mark(name);
        }
        flags
    }
}

/// The long-lived record kept by the repository for every booking that has
/// been seen at least once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurableRecord {
    #[serde(flatten)]
    pub id: BookingId,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub flags: FlagSet,
}

impl DurableRecord {
    pub fn new(id: BookingId, created_at: DateTime<FixedOffset>) -> Self {
        Self {
            id,
            created_at,
            scheduled_at: None,
            flags: FlagSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_last_four_digits() {
        assert_eq!(mask_phone("090-1234-5678"), "***-****-5678");
        assert_eq!(mask_phone("123"), "123");
    }

    #[test]
    fn flags_are_monotonic() {
        let mut flags = FlagSet::new();
        assert!(!flags.is_set("reminder-sent"));
        assert!(flags.mark("reminder-sent"));
        assert!(!flags.mark("reminder-sent"));
        assert!(flags.is_set("reminder-sent"));
    }

    #[test]
    fn booking_deserializes_with_flattened_identity() {
        let booking: Booking = serde_json::from_str(
            r#"{
                "store_id": "s1",
                "booking_id": "b1",
                "scheduled_at": "2026-03-01T18:30:00+09:00",
                "status": "1",
                "phone": "09012345678"
            }"#,
        )
        .unwrap();

        assert_eq!(booking.id, BookingId::new("s1", "b1"));
        assert_eq!(booking.option_text, "");
        assert_eq!(booking.phone_masked().as_deref(), Some("*******5678"));
    }
}
