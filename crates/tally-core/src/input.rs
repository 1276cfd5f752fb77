//! # Write Inputs
//!
//! Payloads the SPA sends to create or change records. Each input has a
//! `validate` that runs the rules from [`crate::validation`], and a
//! `normalized` that trims text and turns blank optionals into `None`.
//! Handlers call both before anything reaches the database.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::role::Role;
use crate::validation::{
    validate_barcode, validate_category_name, validate_cost_cents, validate_description,
    validate_email, validate_full_name, validate_min_stock_level, validate_password,
    validate_price_cents, validate_product_name, validate_stock_quantity, validate_username,
    ValidationResult,
};

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Products & Categories
// =============================================================================

/// Create or full update of a product (the product form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub barcode: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: i64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub min_stock_level: i64,
    #[serde(default)]
    pub category_id: Option<String>,
    /// Only honoured on update; new products are always active.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ProductInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_barcode(&self.barcode)?;
        validate_product_name(&self.name)?;
        validate_description(self.description.as_deref())?;
        validate_price_cents(self.price_cents)?;
        validate_cost_cents(self.cost_cents)?;
        validate_stock_quantity(self.stock_quantity)?;
        validate_min_stock_level(self.min_stock_level)?;
        Ok(())
    }

    pub fn normalized(self) -> Self {
        ProductInput {
            barcode: trimmed(&self.barcode),
            name: trimmed(&self.name),
            description: blank_to_none(self.description),
            category_id: blank_to_none(self.category_id),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_category_name(&self.name)?;
        validate_description(self.description.as_deref())
    }

    pub fn normalized(self) -> Self {
        CategoryInput {
            name: trimmed(&self.name),
            description: blank_to_none(self.description),
        }
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
}

impl NewUser {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_username(&self.username)?;
        validate_password(&self.password)?;
        validate_full_name(&self.full_name)?;
        validate_email(self.email.as_deref())
    }

    /// The password is left untouched.
    pub fn normalized(self) -> Self {
        NewUser {
            username: trimmed(&self.username),
            full_name: trimmed(&self.full_name),
            email: blank_to_none(self.email),
            ..self
        }
    }
}

/// Partial profile update; absent fields are left as they are.
///
/// An empty `email` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.full_name {
            validate_full_name(name)?;
        }
        validate_email(self.email.as_deref())
    }

    pub fn normalized(self) -> Self {
        UserUpdate {
            full_name: self.full_name.map(|n| trimmed(&n)),
            email: self.email.map(|e| trimmed(&e)),
            ..self
        }
    }

    /// True if applying this update would take admin rights away.
    pub fn revokes_admin(&self) -> bool {
        matches!(self.role, Some(role) if role != Role::Admin) || self.is_active == Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    /// Required when users change their own password.
    #[serde(default)]
    pub current_password: Option<String>,
    pub new_password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_password(&self.new_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_input() -> ProductInput {
        ProductInput {
            barcode: " 4006381333931 ".to_string(),
            name: " Ballpoint Pen ".to_string(),
            description: Some("   ".to_string()),
            price_cents: 150,
            cost_cents: 60,
            stock_quantity: 10,
            min_stock_level: 2,
            category_id: Some(String::new()),
            is_active: None,
        }
    }

    #[test]
    fn test_product_input_normalizes() {
        let input = product_input().normalized();
        assert_eq!(input.barcode, "4006381333931");
        assert_eq!(input.name, "Ballpoint Pen");
        assert_eq!(input.description, None);
        assert_eq!(input.category_id, None);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_product_input_rejects_negative_price_and_stock() {
        let mut input = product_input();
        input.price_cents = -1;
        assert!(input.validate().is_err());

        let mut input = product_input();
        input.stock_quantity = -5;
        assert!(input.validate().is_err());

        let mut input = product_input();
        input.min_stock_level = -1;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_product_input_defaults_from_json() {
        let input: ProductInput =
            serde_json::from_str(r#"{"barcode":"A1","name":"Tape","priceCents":250}"#).unwrap();
        assert_eq!(input.cost_cents, 0);
        assert_eq!(input.stock_quantity, 0);
        assert_eq!(input.category_id, None);
    }

    #[test]
    fn test_new_user_validation() {
        let user = NewUser {
            username: "ab".to_string(),
            password: "longenough".to_string(),
            full_name: "Ann Bell".to_string(),
            email: None,
            role: Role::Cashier,
        };
        assert!(user.validate().is_err());

        let user = NewUser {
            username: "ann.bell".to_string(),
            ..user
        };
        assert!(user.validate().is_ok());
    }

    #[test]
    fn test_user_update_revokes_admin() {
        assert!(UserUpdate {
            role: Some(Role::Manager),
            ..Default::default()
        }
        .revokes_admin());
        assert!(UserUpdate {
            is_active: Some(false),
            ..Default::default()
        }
        .revokes_admin());
        assert!(!UserUpdate {
            role: Some(Role::Admin),
            full_name: Some("New Name".to_string()),
            ..Default::default()
        }
        .revokes_admin());
    }
}
