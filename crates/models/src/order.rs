use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Order lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product snapshot captured in a cart line at checkout time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: i64,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: CartProduct,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// A locally persisted order.
///
/// Stored as camelCase JSON so existing ledgers written by the web client
/// decode unchanged, including numeric `userId`s (read back as their decimal
/// string). Timestamps serialize as RFC 3339 in UTC.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(deserialize_with = "crate::de::id_string")]
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// `"ORD-"` followed by the last six digits of the millisecond timestamp.
    pub fn id_from_millis(millis: i64) -> String {
        format!("ORD-{:06}", millis.rem_euclid(1_000_000))
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Amounts must survive a JSON round trip; NaN and infinities would be
    /// written as `null` and poison the record.
    pub fn validate_amounts(items: &[CartItem], total: f64) -> Result<(), ModelError> {
        if !total.is_finite() {
            return Err(ModelError::Validation(format!("order total must be finite, got {total}")));
        }
        if let Some(bad) = items.iter().find(|i| !i.line_total().is_finite()) {
            return Err(ModelError::Validation(format!(
                "price of {} must be finite, got {}",
                bad.product.name, bad.product.price
            )));
        }
        Ok(())
    }
}
