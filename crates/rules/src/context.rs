//! Per-booking evaluation context.

use std::sync::Arc;

use bookwatch_core::{Booking, BookingId, Clock, FlagSet, RecordRepository, RepositoryError};
use bookwatch_notify::Dispatcher;
use chrono::{DateTime, FixedOffset};
use serde_json::{json, Map, Value};

use crate::schema::StoreProfile;

/// Collaborators reachable from conditions and actions.
#[derive(Clone)]
pub struct Services {
    pub repository: Arc<dyn RecordRepository>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Services {
    pub fn new(repository: Arc<dyn RecordRepository>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { repository, dispatcher }
    }
}

/// The unit of evaluation: one booking, a frozen "now", the record's current
/// flags and the collaborators.
///
/// `flags` mirrors what the repository holds. Actions that write a flag
/// update both, so later rules in the same invocation see the new value.
pub struct BookingContext {
    pub booking: Booking,
    pub now: DateTime<FixedOffset>,
    pub flags: FlagSet,
    pub services: Services,
}

impl BookingContext {
    pub fn new(booking: Booking, now: DateTime<FixedOffset>, flags: FlagSet, services: Services) -> Self {
        Self { booking, now, flags, services }
    }

    /// Build a context with flags read from the repository. Records that do
    /// not exist yet start with no flags.
    pub async fn load(
        booking: Booking,
        clock: &dyn Clock,
        services: Services,
    ) -> Result<Self, RepositoryError> {
        let flags = services
            .repository
            .get(&booking.id)
            .await?
            .map(|record| record.flags)
            .unwrap_or_default();
        Ok(Self::new(booking, clock.now(), flags, services))
    }

    pub fn identity(&self) -> &BookingId {
        &self.booking.id
    }

    /// JSON view used to resolve parameter references and render templates.
    pub fn view(&self, store: Option<&StoreProfile>) -> Value {
        let b = &self.booking;
        let flags: Map<String, Value> = self
            .flags
            .iter()
            .map(|(name, set)| (name.to_string(), Value::Bool(set)))
            .collect();
        let options: Vec<&str> = b
            .option_text
            .split(|c: char| c == ',' || c == '\n' || c == '、')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let store = match store {
            Some(profile) => {
                let mut value = serde_json::to_value(profile).unwrap_or(Value::Null);
                if let Value::Object(map) = &mut value {
                    map.insert("id".to_string(), json!(b.id.store_id));
                }
                value
            }
            None => json!({ "id": b.id.store_id }),
        };

        json!({
            "booking": {
                "store_id": b.id.store_id,
                "booking_id": b.id.booking_id,
                "scheduled_at": b.scheduled_at.to_rfc3339(),
                "scheduled_date": b.scheduled_at.format("%Y-%m-%d").to_string(),
                "scheduled_clock": b.scheduled_at.format("%H:%M").to_string(),
                "status": b.status,
                "option_text": b.option_text,
                "options": options,
                "customer_name": b.customer_name,
                "phone": b.phone,
                "phone_masked": b.phone_masked(),
            },
            "store": store,
            "flags": flags,
            "attributes": b.attributes,
            "now": self.now.to_rfc3339(),
            "today": self.now.format("%Y-%m-%d").to_string(),
        })
    }
}

impl std::fmt::Debug for BookingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingContext")
            .field("booking", &self.booking.id)
            .field("now", &self.now)
            .field("flags", &self.flags)
            .finish()
    }
}
