//! Deposit payment methods and payment-id generation.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LedgerError;

/// Supported deposit rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// bKash mobile wallet.
    Bkash,
    /// Nagad mobile wallet.
    Nagad,
    /// Tether on-chain transfer.
    Usdt,
}

impl PaymentMethod {
    /// Every accepted method.
    pub const ALL: [Self; 3] = [Self::Bkash, Self::Nagad, Self::Usdt];

    /// Wire name, also used as the payment-id prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bkash => "bkash",
            Self::Nagad => "nagad",
            Self::Usdt => "usdt",
        }
    }

    /// Builds the provider-scoped payment id used as the ledger reference.
    ///
    /// A caller-supplied idempotency key yields a stable id; otherwise the id
    /// is derived from the current time plus a random suffix.
    #[must_use]
    pub fn payment_id(self, idempotency_key: Option<&str>) -> String {
        match idempotency_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => format!("{}_{key}", self.as_str()),
            None => format!("{}_{}", self.as_str(), timestamp_reference()),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == lowered)
            .ok_or_else(|| LedgerError::UnsupportedMethod(s.to_string()))
    }
}

/// `<millis>_<8 hex chars>`: sortable by time, unique across concurrent
/// requests within the same millisecond.
#[must_use]
pub fn timestamp_reference() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let short = suffix.get(..8).unwrap_or(&suffix);
    format!("{}_{short}", Utc::now().timestamp_millis())
}
