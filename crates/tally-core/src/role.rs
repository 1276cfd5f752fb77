//! # Roles & Permissions
//!
//! Role tiers gate which dashboard sections and API routes a user reaches.
//! Every route asks [`Role::can`] instead of comparing roles inline, so the
//! matrix below is the only place the policy lives.
//!
//! ```text
//! ┌──────────────────────────┬───────┬─────────┬─────────┐
//! │ permission               │ admin │ manager │ cashier │
//! ├──────────────────────────┼───────┼─────────┼─────────┤
//! │ ViewCatalog              │   ✓   │    ✓    │    ✓    │
//! │ EditCatalog              │   ✓   │    ✓    │         │
//! │ DeleteCategory           │   ✓   │         │         │
//! │ Restock                  │   ✓   │    ✓    │         │
//! │ Checkout                 │   ✓   │    ✓    │    ✓    │
//! │ ViewAllTransactions      │   ✓   │    ✓    │         │
//! │ Refund                   │   ✓   │    ✓    │         │
//! │ DeleteTransaction        │   ✓   │         │         │
//! │ ViewReports              │   ✓   │    ✓    │         │
//! │ ManageUsers              │   ✓   │         │         │
//! └──────────────────────────┴───────┴─────────┴─────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

/// A user's role tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

/// An action a route may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    ViewCatalog,
    EditCatalog,
    DeleteCategory,
    Restock,
    Checkout,
    ViewAllTransactions,
    Refund,
    DeleteTransaction,
    ViewReports,
    ManageUsers,
}

impl Role {
    /// All roles, highest tier first.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Cashier];

    /// Returns true if this role grants `permission`.
    pub fn can(&self, permission: Permission) -> bool {
        use Permission::*;

        match self {
            Role::Admin => true,
            Role::Manager => !matches!(
                permission,
                DeleteCategory | DeleteTransaction | ManageUsers
            ),
            Role::Cashier => matches!(permission, ViewCatalog | Checkout),
        }
    }

    /// Like [`Role::can`] but returns a `PermissionDenied` error.
    pub fn require(&self, permission: Permission) -> CoreResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied {
                role: *self,
                permission,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Cashier => "cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "cashier" => Ok(Role::Cashier),
            _ => Err(ValidationError::InvalidFormat {
                field: "role".to_string(),
                reason: "must be admin, manager or cashier".to_string(),
            }),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Permission::ViewCatalog => "view the catalog",
            Permission::EditCatalog => "edit the catalog",
            Permission::DeleteCategory => "delete categories",
            Permission::Restock => "restock products",
            Permission::Checkout => "check out sales",
            Permission::ViewAllTransactions => "view all transactions",
            Permission::Refund => "refund transactions",
            Permission::DeleteTransaction => "delete transactions",
            Permission::ViewReports => "view reports",
            Permission::ManageUsers => "manage users",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_can_everything() {
        for p in [
            Permission::ViewCatalog,
            Permission::EditCatalog,
            Permission::DeleteCategory,
            Permission::Restock,
            Permission::Checkout,
            Permission::ViewAllTransactions,
            Permission::Refund,
            Permission::DeleteTransaction,
            Permission::ViewReports,
            Permission::ManageUsers,
        ] {
            assert!(Role::Admin.can(p), "admin should {}", p);
        }
    }

    #[test]
    fn test_manager_limits() {
        assert!(Role::Manager.can(Permission::Restock));
        assert!(Role::Manager.can(Permission::Refund));
        assert!(Role::Manager.can(Permission::ViewReports));
        assert!(!Role::Manager.can(Permission::ManageUsers));
        assert!(!Role::Manager.can(Permission::DeleteTransaction));
        assert!(!Role::Manager.can(Permission::DeleteCategory));
    }

    #[test]
    fn test_cashier_limits() {
        assert!(Role::Cashier.can(Permission::Checkout));
        assert!(Role::Cashier.can(Permission::ViewCatalog));
        assert!(!Role::Cashier.can(Permission::ViewReports));
        assert!(!Role::Cashier.can(Permission::Restock));
        assert!(!Role::Cashier.can(Permission::Refund));
        assert!(Role::Cashier.require(Permission::EditCatalog).is_err());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!(" cashier ".parse::<Role>().unwrap(), Role::Cashier);
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
