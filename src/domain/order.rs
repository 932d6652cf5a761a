use crate::error::CheckoutError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Represents a strictly positive monetary amount to be charged.
///
/// Crosses the wire as a plain JSON number, which is what the storefront and
/// the processor proxy both speak.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, CheckoutError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(CheckoutError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CheckoutError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = rust_decimal::serde::float::deserialize(deserializer)?;
        Amount::new(value).map_err(<D::Error as serde::de::Error>::custom)
    }
}

/// E-mail address of the signed-in user, used as the payer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PayerIdentity(String);

impl PayerIdentity {
    pub fn new(email: impl Into<String>) -> Result<Self, CheckoutError> {
        let email = email.into().trim().to_string();
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if valid {
            Ok(Self(email))
        } else {
            Err(CheckoutError::ValidationError(format!(
                "'{email}' is not a valid e-mail address"
            )))
        }
    }

    pub fn email(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PayerIdentity {
    type Error = CheckoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PayerIdentity> for String {
    fn from(payer: PayerIdentity) -> Self {
        payer.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_ref: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Order summary handed to the payment step by the cart collaborator.
///
/// Treated as immutable input; it is carried unchanged to the order
/// confirmation destination once the payment settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderContext {
    pub order_id: String,
    pub total: Amount,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl OrderContext {
    pub fn new(order_id: impl Into<String>, total: Amount, items: Vec<LineItem>) -> Self {
        Self {
            order_id: order_id.into(),
            total,
            items,
        }
    }

    /// Rejects order summaries the payment step cannot charge.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.order_id.trim().is_empty() {
            return Err(CheckoutError::ValidationError(
                "Order id must not be empty".to_string(),
            ));
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(CheckoutError::ValidationError(format!(
                "Line item '{}' has zero quantity",
                item.product_ref
            )));
        }
        Ok(())
    }
}
