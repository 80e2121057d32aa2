//! Roles - explicit capabilities checked at every gated entry point

use crate::address::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Capability held by a caller
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Vault administrator: approves standard requests, rejects, configures
    Admin,
    /// Multisig owner: signs high-value requests
    Signer,
    /// Registered contributor: submits payout requests
    Contributor,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Unauthorized: {account} lacks role {required}")]
    Unauthorized { account: AccountId, required: String },
}

/// An account together with the roles it holds for this call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account: AccountId,
    roles: BTreeSet<Role>,
}

impl Caller {
    pub fn new(account: AccountId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            account,
            roles: roles.into_iter().collect(),
        }
    }

    /// A caller with no roles (anyone may still submit when registration is open)
    pub fn anonymous(account: AccountId) -> Self {
        Self::new(account, [])
    }

    pub fn has(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    /// Fail unless the caller holds `role`
    pub fn require(&self, role: Role) -> Result<(), AccessError> {
        if self.has(role) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                account: self.account.clone(),
                required: role.to_string(),
            })
        }
    }

    /// Fail unless the caller holds at least one of `roles`
    pub fn require_any(&self, roles: &[Role]) -> Result<(), AccessError> {
        if roles.iter().any(|r| self.has(*r)) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                account: self.account.clone(),
                required: roles
                    .iter()
                    .map(|r| r.as_ref())
                    .collect::<Vec<_>>()
                    .join("|"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("SIGNER".parse::<Role>().unwrap(), Role::Signer);
        assert_eq!(Role::Contributor.to_string(), "contributor");
    }

    #[test]
    fn test_require() {
        let caller = Caller::new(account("0xadmin"), [Role::Admin, Role::Signer]);
        assert!(caller.require(Role::Admin).is_ok());
        assert!(caller.require(Role::Signer).is_ok());

        let err = caller.require(Role::Contributor).unwrap_err();
        assert!(matches!(err, AccessError::Unauthorized { ref required, .. } if required == "contributor"));
    }

    #[test]
    fn test_require_any() {
        let signer = Caller::new(account("0xsigner"), [Role::Signer]);
        assert!(signer.require_any(&[Role::Admin, Role::Signer]).is_ok());

        let nobody = Caller::anonymous(account("0xnobody"));
        let err = nobody.require_any(&[Role::Admin, Role::Signer]).unwrap_err();
        assert!(matches!(err, AccessError::Unauthorized { ref required, .. } if required == "admin|signer"));
    }
}
