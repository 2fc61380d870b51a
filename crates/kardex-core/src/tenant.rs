//! # Tenants and Callers
//!
//! Every engine operation runs on behalf of a [`CallerIdentity`]: the tenant
//! whose rows may be touched, the acting user, and that user's role.
//!
//! ```text
//!   X-Tenant-Id / X-User-Id / X-User-Role   (apps/api)
//!                     │
//!                     ▼
//!             CallerIdentity ──► every repository query filters tenant_id
//!                     │
//!                     └──► require_any(&[Role::Admin]) for privileged ops
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Role
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }

    /// Parses a role name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        [Role::Admin, Role::Manager, Role::Staff]
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Caller Identity
// =============================================================================

/// Who is asking. Established by the caller before any engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub tenant_id: String,
    pub user_id: String,
    pub role: Role,
}

impl CallerIdentity {
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>, role: Role) -> Self {
        CallerIdentity {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
            role,
        }
    }

    /// Fails with `Forbidden` unless the caller holds one of `allowed`.
    pub fn require_any(&self, allowed: &[Role], operation: &str) -> CoreResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                role: self.role,
                operation: operation.to_string(),
            })
        }
    }
}

// =============================================================================
// Tenant Limits
// =============================================================================

/// Per-tenant configuration the engine enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TenantLimits {
    pub tenant_id: String,
    pub invoice_prefix: String,
    /// `None` means unlimited.
    pub max_invoices_per_month: Option<i64>,
}

impl TenantLimits {
    /// Checks whether one more invoice fits the monthly quota.
    ///
    /// `used` is the number of invoices already issued this calendar month.
    pub fn check_invoice_quota(&self, used: i64) -> CoreResult<()> {
        match self.max_invoices_per_month {
            Some(limit) if used >= limit => Err(CoreError::QuotaExceeded { limit, used }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max: Option<i64>) -> TenantLimits {
        TenantLimits {
            tenant_id: "t1".into(),
            invoice_prefix: "INV".into(),
            max_invoices_per_month: max,
        }
    }

    #[test]
    fn test_quota() {
        assert!(limits(None).check_invoice_quota(1_000_000).is_ok());
        assert!(limits(Some(2)).check_invoice_quota(1).is_ok());
        assert!(matches!(
            limits(Some(2)).check_invoice_quota(2),
            Err(CoreError::QuotaExceeded { limit: 2, used: 2 })
        ));
        assert!(limits(Some(0)).check_invoice_quota(0).is_err());
    }

    #[test]
    fn test_require_any() {
        let staff = CallerIdentity::new("t1", "u1", Role::Staff);
        assert!(staff.require_any(&[Role::Admin, Role::Manager, Role::Staff], "create").is_ok());
        let err = staff.require_any(&[Role::Admin], "delete payment").unwrap_err();
        assert_eq!(err.to_string(), "Role staff is not allowed to delete payment");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("manager"), Some(Role::Manager));
        assert_eq!(Role::parse("owner"), None);
    }
}
