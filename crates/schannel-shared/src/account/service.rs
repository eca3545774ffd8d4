use chrono::NaiveDate;

/// The subscription plan the user is paying for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Identifier the portal uses for this service (part of its links)
    pub id: String,
    pub product: String,
    /// Price per billing cycle in minor currency units
    pub price: i64,
    pub state: ServiceState,
    pub next_due: Option<NaiveDate>,
    pub link: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ServiceState {
    Pending,
    Active,
    Suspended,
    Terminated,
    Cancelled,
}

impl Service {
    /// Returns `true` if nodes for this service are expected to work
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, ServiceState::Active)
    }
}
