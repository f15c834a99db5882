//! Role normalization shared by the route guard and the post-auth router.
//!
//! The backend sends roles as free-form strings (`"vendor"`, `"ROLE_SELLER"`,
//! `"Buyer"`). Everything is funneled through [`Role::parse`] so the synonym
//! table lives in one place.

use std::fmt;

/// Canonical account role after normalization.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Buyer accounts. `BUYER` and `USER` are synonyms.
    User,
    /// Seller accounts. `SELLER` and `VENDOR` are synonyms.
    Vendor,
    Admin,
    /// Any other non-empty role, uppercased.
    Other(String),
}

impl Role {
    /// Normalizes a raw role string: trim, uppercase, strip an optional
    /// `ROLE_` prefix and apply the synonym table. Empty input yields `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        let name = upper.strip_prefix("ROLE_").unwrap_or(upper.as_str()).trim();

        match name {
            "" => None,
            "USER" | "BUYER" => Some(Role::User),
            "VENDOR" | "SELLER" => Some(Role::Vendor),
            "ADMIN" => Some(Role::Admin),
            other => Some(Role::Other(other.to_string())),
        }
    }

    /// Canonical uppercase name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "USER",
            Role::Vendor => "VENDOR",
            Role::Admin => "ADMIN",
            Role::Other(name) => name,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// True when both strings normalize to the same role.
#[must_use]
pub fn roles_match(actual: &str, required: &str) -> bool {
    match (Role::parse(actual), Role::parse(required)) {
        (Some(actual), Some(required)) => actual == required,
        _ => false,
    }
}

/// Account type a login or registration form is bound to. Each one has its
/// own login path segment and registration endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccountKind {
    User,
    Vendor,
    Admin,
}

impl AccountKind {
    /// Parses a role string into an account kind. Unknown roles are rejected.
    #[must_use]
    pub fn from_role(raw: &str) -> Option<Self> {
        match Role::parse(raw)? {
            Role::User => Some(AccountKind::User),
            Role::Vendor => Some(AccountKind::Vendor),
            Role::Admin => Some(AccountKind::Admin),
            Role::Other(_) => None,
        }
    }

    #[must_use]
    pub fn role(self) -> Role {
        match self {
            AccountKind::User => Role::User,
            AccountKind::Vendor => Role::Vendor,
            AccountKind::Admin => Role::Admin,
        }
    }

    /// `POST /auth/{segment}/login`
    #[must_use]
    pub fn login_path(self) -> String {
        let segment = match self {
            AccountKind::User => "user",
            AccountKind::Vendor => "vendor",
            AccountKind::Admin => "admin",
        };
        format!("/auth/{segment}/login")
    }

    #[must_use]
    pub fn register_path(self) -> &'static str {
        match self {
            AccountKind::User => "/auth/register",
            AccountKind::Vendor => "/auth/vendor/register",
            AccountKind::Admin => "/auth/admin/register",
        }
    }
}
