//! Status enums for orders and payments.

use serde::{Deserialize, Serialize};

/// How the customer pays for an order.
///
/// The set is closed. Canonical wire names are kebab-case; the short names
/// used by the first version of the storefront are still accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Pay the courier in cash on delivery.
    #[serde(alias = "cod")]
    CashOnDelivery,
    /// Redirect to a hosted checkout page of an external payment provider.
    #[serde(alias = "thawani")]
    HostedCheckout,
    /// Bank/mobile transfer outside the shop, proven by an uploaded receipt.
    #[serde(alias = "mobile")]
    ManualTransfer,
}

impl PaymentMethod {
    /// All payment methods, in the order they are offered at checkout.
    pub const ALL: [Self; 3] = [
        Self::CashOnDelivery,
        Self::HostedCheckout,
        Self::ManualTransfer,
    ];

    /// Canonical storage/wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash-on-delivery",
            Self::HostedCheckout => "hosted-checkout",
            Self::ManualTransfer => "manual-transfer",
        }
    }

    /// Whether the method needs a transfer receipt attached to the order.
    #[must_use]
    pub const fn requires_receipt(self) -> bool {
        matches!(self, Self::ManualTransfer)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash-on-delivery" | "cod" => Ok(Self::CashOnDelivery),
            "hosted-checkout" | "thawani" => Ok(Self::HostedCheckout),
            "manual-transfer" | "mobile" => Ok(Self::ManualTransfer),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Order lifecycle status.
///
/// Orders are created `pending` and nothing moves them on yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
}

impl OrderStatus {
    /// Storage/wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
