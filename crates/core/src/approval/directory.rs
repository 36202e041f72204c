//! Index of company users keyed by ID.
//!
//! Manager links are plain IDs resolved through the directory, so a broken
//! or cyclic hierarchy never turns into a dangling reference.

use std::collections::{HashMap, HashSet};

use reimburse_shared::types::{CompanyId, UserId};

use super::error::ApprovalError;
use super::model::User;

/// Arena of users addressed by ID.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<UserId, User>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    pub fn insert(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Looks up a user.
    #[must_use]
    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Returns true if the user exists.
    #[must_use]
    pub fn contains(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// Returns true if the user is an active manager or admin of `company_id`.
    ///
    /// Only such users can act on an expense, so anyone else is treated as
    /// a stale approver.
    #[must_use]
    pub fn can_approve(&self, id: UserId, company_id: CompanyId) -> bool {
        self.get(id)
            .is_some_and(|u| u.company_id == company_id && u.is_active && u.role.can_approve())
    }

    /// Number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns true if the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Returns the user's manager, if both exist.
    #[must_use]
    pub fn manager_of(&self, id: UserId) -> Option<&User> {
        let manager_id = self.get(id)?.manager_id?;
        self.get(manager_id)
    }

    /// Returns true if making `manager_id` the manager of `user_id` would
    /// close a loop in the hierarchy.
    #[must_use]
    pub fn would_create_cycle(&self, user_id: UserId, manager_id: UserId) -> bool {
        let mut seen = HashSet::new();
        let mut cursor = Some(manager_id);

        while let Some(id) = cursor {
            if id == user_id {
                return true;
            }
            if !seen.insert(id) {
                // Pre-existing loop above `user_id`; it does not pass through them.
                return false;
            }
            cursor = self.get(id).and_then(|u| u.manager_id);
        }
        false
    }

    /// Checks that `manager_id` can be assigned as the manager of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::Validation` when the manager is not an active
    /// manager or admin of the company, or the assignment would create a cycle.
    pub fn validate_manager_assignment(
        &self,
        user_id: UserId,
        company_id: CompanyId,
        manager_id: UserId,
    ) -> Result<(), ApprovalError> {
        if !self.can_approve(manager_id, company_id) {
            return Err(ApprovalError::Validation(
                "Manager must be an active manager or admin in the same company".to_string(),
            ));
        }
        if self.would_create_cycle(user_id, manager_id) {
            return Err(ApprovalError::Validation(
                "Manager assignment would create a reporting cycle".to_string(),
            ));
        }
        Ok(())
    }
}

impl FromIterator<User> for UserDirectory {
    fn from_iter<T: IntoIterator<Item = User>>(iter: T) -> Self {
        let mut directory = Self::new();
        for user in iter {
            directory.insert(user);
        }
        directory
    }
}
