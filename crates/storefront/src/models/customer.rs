//! Customers and their shipping addresses.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use aunclic_core::{AddressId, CustomerId, Email};

/// A shopper, keyed by their Supabase auth identity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub auth_id: Uuid,
    pub email: Email,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShippingAddress {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub recipient: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} is too long")]
    TooLong(&'static str),
}

/// Address form as submitted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AddressInput {
    pub recipient: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

const MAX_FIELD_LENGTH: usize = 200;

impl AddressInput {
    /// Trim every field, default the country to Canada, upper-case the
    /// postal code and reject blanks.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] naming the first bad field.
    pub fn normalize(self) -> Result<Self, AddressError> {
        let required = |value: String, field: &'static str| -> Result<String, AddressError> {
            let value = value.trim().to_owned();
            if value.is_empty() {
                return Err(AddressError::Missing(field));
            }
            if value.chars().count() > MAX_FIELD_LENGTH {
                return Err(AddressError::TooLong(field));
            }
            Ok(value)
        };

        let country = if self.country.trim().is_empty() {
            "Canada".to_owned()
        } else {
            self.country
        };
        let phone = self
            .phone
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());
        if phone.as_ref().is_some_and(|p| p.chars().count() > 32) {
            return Err(AddressError::TooLong("phone"));
        }

        Ok(Self {
            recipient: required(self.recipient, "recipient")?,
            street: required(self.street, "street")?,
            city: required(self.city, "city")?,
            province: required(self.province, "province")?,
            postal_code: required(self.postal_code, "postal_code")?.to_uppercase(),
            country: required(country, "country")?,
            phone,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            recipient: " Ana Gómez ".to_owned(),
            street: "123 rue Sainte-Catherine".to_owned(),
            city: "Montréal".to_owned(),
            province: "QC".to_owned(),
            postal_code: "h2x 1k4".to_owned(),
            country: String::new(),
            phone: Some("  ".to_owned()),
        }
    }

    #[test]
    fn normalizes_fields() {
        let address = input().normalize().unwrap();
        assert_eq!(address.recipient, "Ana Gómez");
        assert_eq!(address.postal_code, "H2X 1K4");
        assert_eq!(address.country, "Canada");
        assert_eq!(address.phone, None);
    }

    #[test]
    fn rejects_blank_required_field() {
        let mut bad = input();
        bad.city = "   ".to_owned();
        assert_eq!(bad.normalize(), Err(AddressError::Missing("city")));
    }

    #[test]
    fn rejects_overlong_field() {
        let mut bad = input();
        bad.street = "x".repeat(201);
        assert_eq!(bad.normalize(), Err(AddressError::TooLong("street")));
    }
}
