//! User repository: directory queries and user administration.

use chrono::Utc;
use reimburse_core::approval::validation::effective_manager_approver;
use reimburse_core::approval::{ApprovalError, User, UserRole as Role};
use reimburse_shared::types::UserId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::UserRole, users};

use super::error::RepositoryError;
use super::mapping::{core_role_to_db, required_text, user_from_model};
use super::routing::load_directory;

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Full name.
    pub name: String,
    /// Login email, unique across companies.
    pub email: String,
    /// Role within the company.
    pub role: Role,
    /// Direct manager.
    pub manager_id: Option<UserId>,
    /// Requested manager-approver flag; dropped unless `role` is manager.
    pub is_manager_approver: bool,
}

/// Input for updating a user. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New name.
    pub name: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// New manager; `Some(None)` clears it.
    pub manager_id: Option<Option<UserId>>,
    /// New manager-approver flag.
    pub is_manager_approver: Option<bool>,
    /// Activation flag.
    pub is_active: Option<bool>,
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user of the company.
    pub async fn find(&self, company_id: Uuid, user_id: Uuid) -> Result<User, RepositoryError> {
        let model = users::Entity::find_by_id(user_id)
            .filter(users::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound("User"))?;
        Ok(user_from_model(model))
    }

    /// Every user of the company, ordered by name.
    pub async fn list_company(&self, company_id: Uuid) -> Result<Vec<User>, RepositoryError> {
        let rows = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .order_by_asc(users::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(user_from_model).collect())
    }

    /// Users whose direct manager is `manager_id`, ordered by name.
    pub async fn list_direct_reports(
        &self,
        company_id: Uuid,
        manager_id: Uuid,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::ManagerId.eq(manager_id))
            .order_by_asc(users::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(user_from_model).collect())
    }

    /// Active managers, ordered by name.
    pub async fn list_managers(&self, company_id: Uuid) -> Result<Vec<User>, RepositoryError> {
        self.list_active_with_roles(company_id, &[UserRole::Manager])
            .await
    }

    /// Active users who can hold an approval step: managers and admins.
    pub async fn list_approvers(&self, company_id: Uuid) -> Result<Vec<User>, RepositoryError> {
        self.list_active_with_roles(company_id, &[UserRole::Manager, UserRole::Admin])
            .await
    }

    /// Creates a user in the company.
    pub async fn create(
        &self,
        company_id: Uuid,
        input: CreateUserInput,
    ) -> Result<User, RepositoryError> {
        let name = required_text(&input.name, "name")?;
        let email = input.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(
                ApprovalError::Validation("A valid email is required".to_string()).into(),
            );
        }

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(
                ApprovalError::Conflict(format!("Email '{email}' is already registered")).into(),
            );
        }

        let id = UserId::new();
        if let Some(manager_id) = input.manager_id {
            let directory = load_directory(&self.db, company_id).await?;
            directory.validate_manager_assignment(id, company_id.into(), manager_id)?;
        }

        let now = Utc::now().into();
        let model = users::ActiveModel {
            id: Set(id.into_inner()),
            company_id: Set(company_id),
            name: Set(name),
            email: Set(email),
            role: Set(core_role_to_db(input.role)),
            manager_id: Set(input.manager_id.map(UserId::into_inner)),
            is_manager_approver: Set(effective_manager_approver(
                input.role,
                input.is_manager_approver,
            )),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(user_id = %model.id, company_id = %company_id, "User created");
        Ok(user_from_model(model))
    }

    /// Updates a user of the company.
    ///
    /// A manager change is checked against the whole reporting chain inside
    /// the same transaction as the write.
    pub async fn update(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> Result<User, RepositoryError> {
        let txn = self.db.begin().await?;

        let model = users::Entity::find_by_id(user_id)
            .filter(users::Column::CompanyId.eq(company_id))
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound("User"))?;
        let current = user_from_model(model.clone());

        let role = input.role.unwrap_or(current.role);
        let requested_flag = input
            .is_manager_approver
            .unwrap_or(current.is_manager_approver);

        let mut active: users::ActiveModel = model.into();
        if let Some(name) = input.name {
            active.name = Set(required_text(&name, "name")?);
        }
        if let Some(manager_id) = input.manager_id {
            if let Some(manager_id) = manager_id {
                let directory = load_directory(&txn, company_id).await?;
                directory.validate_manager_assignment(current.id, company_id.into(), manager_id)?;
            }
            active.manager_id = Set(manager_id.map(UserId::into_inner));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.role = Set(core_role_to_db(role));
        active.is_manager_approver = Set(effective_manager_approver(role, requested_flag));
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(user_id = %user_id, role = role.as_str(), "User updated");
        Ok(user_from_model(updated))
    }

    async fn list_active_with_roles(
        &self,
        company_id: Uuid,
        roles: &[UserRole],
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::IsActive.eq(true))
            .filter(users::Column::Role.is_in(roles.iter().copied()))
            .order_by_asc(users::Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(user_from_model).collect())
    }
}
