//! Shared security primitives for the exchange contract
//!
//! Access control for privileged actions and the pause guard backing the
//! exchange's running flag.

use serde::{Deserialize, Serialize};
use types::ids::AccountName;

use crate::errors::ExchangeError;

/// Admin-based access control.
///
/// One account administers the exchange. Administration can be handed over
/// only by the current admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    admin: AccountName,
}

impl AccessControl {
    /// Create access control with an initial admin.
    pub fn new(admin: AccountName) -> Self {
        Self { admin }
    }

    /// Check if a caller is admin.
    pub fn is_admin(&self, caller: &AccountName) -> bool {
        &self.admin == caller
    }

    /// Reject any caller other than the admin.
    pub fn require_admin(&self, caller: &AccountName) -> Result<(), ExchangeError> {
        if !self.is_admin(caller) {
            return Err(ExchangeError::Unauthorized {
                account: caller.clone(),
            });
        }
        Ok(())
    }

    /// Accept the owner of a resource or the admin.
    pub fn require_owner_or_admin(
        &self,
        caller: &AccountName,
        owner: &AccountName,
    ) -> Result<(), ExchangeError> {
        if caller == owner || self.is_admin(caller) {
            Ok(())
        } else {
            Err(ExchangeError::Unauthorized {
                account: caller.clone(),
            })
        }
    }

    /// Transfer admin to a new account.
    pub fn transfer_admin(&mut self, current_admin: &AccountName, new_admin: AccountName) -> bool {
        if !self.is_admin(current_admin) {
            return false;
        }
        self.admin = new_admin;
        true
    }

    /// Get the current admin.
    pub fn admin(&self) -> &AccountName {
        &self.admin
    }
}

/// Composable pause modifier.
///
/// When paused, public trading actions must be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    /// Create a guard that starts paused.
    pub fn paused() -> Self {
        Self { paused: true }
    }

    /// Pause operations.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Unpause operations.
    pub fn unpause(&mut self) {
        self.paused = false;
    }

    /// Check if currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Reject the action while paused.
    pub fn require_running(&self) -> Result<(), ExchangeError> {
        if self.paused {
            return Err(ExchangeError::Paused);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- AccessControl tests ---

    #[test]
    fn test_access_control_admin() {
        let ac = AccessControl::new(AccountName::from("alice"));
        assert!(ac.is_admin(&AccountName::from("alice")));
        assert!(!ac.is_admin(&AccountName::from("bob")));
        assert!(ac.require_admin(&AccountName::from("bob")).is_err());
    }

    #[test]
    fn test_access_control_owner_or_admin() {
        let ac = AccessControl::new(AccountName::from("admin"));
        let owner = AccountName::from("alice");
        assert!(ac.require_owner_or_admin(&owner, &owner).is_ok());
        assert!(ac.require_owner_or_admin(&AccountName::from("admin"), &owner).is_ok());
        assert_eq!(
            ac.require_owner_or_admin(&AccountName::from("mallory"), &owner),
            Err(ExchangeError::Unauthorized {
                account: AccountName::from("mallory")
            })
        );
    }

    #[test]
    fn test_access_control_transfer_admin() {
        let mut ac = AccessControl::new(AccountName::from("alice"));
        assert!(!ac.transfer_admin(&AccountName::from("bob"), AccountName::from("bob")));
        assert!(ac.transfer_admin(&AccountName::from("alice"), AccountName::from("bob")));
        assert!(ac.is_admin(&AccountName::from("bob")));
        assert!(!ac.is_admin(&AccountName::from("alice")));
        assert_eq!(ac.admin(), &AccountName::from("bob"));
    }

    // --- PauseGuard tests ---

    #[test]
    fn test_pause_guard() {
        let mut pg = PauseGuard::paused();
        pg.unpause();
        assert!(!pg.is_paused());
        pg.pause();
        assert!(pg.is_paused());
        assert_eq!(pg.require_running(), Err(ExchangeError::Paused));
        pg.unpause();
        assert!(pg.require_running().is_ok());
    }

    #[test]
    fn test_pause_guard_starts_paused() {
        assert!(PauseGuard::paused().is_paused());
    }
}
