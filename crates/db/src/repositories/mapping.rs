//! Conversions between stored rows and the routing engine's domain records.

use chrono::{DateTime, Utc};
use reimburse_core::approval::types as domain;
use reimburse_core::approval::{
    ApprovalError, ApprovalFlow, ApprovalRule, ApprovalStep, Company, Expense, HistoryEntry, User,
};
use reimburse_shared::types::CurrencyCode;
use sea_orm::entity::prelude::{DateTimeWithTimeZone, Json};
use sea_orm::Set;

use crate::entities::sea_orm_active_enums::{
    ApprovalAction, ApprovalRuleType, ExpenseStatus, UserRole,
};
use crate::entities::{approval_flows, approval_history, approval_rules, companies, expenses, users};

use super::error::RepositoryError;

pub(crate) const fn db_role_to_core(role: UserRole) -> domain::UserRole {
    match role {
        UserRole::Employee => domain::UserRole::Employee,
        UserRole::Manager => domain::UserRole::Manager,
        UserRole::Admin => domain::UserRole::Admin,
    }
}

pub(crate) const fn core_role_to_db(role: domain::UserRole) -> UserRole {
    match role {
        domain::UserRole::Employee => UserRole::Employee,
        domain::UserRole::Manager => UserRole::Manager,
        domain::UserRole::Admin => UserRole::Admin,
    }
}

pub(crate) const fn db_status_to_core(status: ExpenseStatus) -> domain::ExpenseStatus {
    match status {
        ExpenseStatus::Pending => domain::ExpenseStatus::Pending,
        ExpenseStatus::Approved => domain::ExpenseStatus::Approved,
        ExpenseStatus::Rejected => domain::ExpenseStatus::Rejected,
        ExpenseStatus::Escalated => domain::ExpenseStatus::Escalated,
    }
}

pub(crate) const fn core_status_to_db(status: domain::ExpenseStatus) -> ExpenseStatus {
    match status {
        domain::ExpenseStatus::Pending => ExpenseStatus::Pending,
        domain::ExpenseStatus::Approved => ExpenseStatus::Approved,
        domain::ExpenseStatus::Rejected => ExpenseStatus::Rejected,
        domain::ExpenseStatus::Escalated => ExpenseStatus::Escalated,
    }
}

const fn db_action_to_core(action: ApprovalAction) -> domain::HistoryAction {
    match action {
        ApprovalAction::Approved => domain::HistoryAction::Approved,
        ApprovalAction::Rejected => domain::HistoryAction::Rejected,
        ApprovalAction::Escalated => domain::HistoryAction::Escalated,
    }
}

const fn core_action_to_db(action: domain::HistoryAction) -> ApprovalAction {
    match action {
        domain::HistoryAction::Approved => ApprovalAction::Approved,
        domain::HistoryAction::Rejected => ApprovalAction::Rejected,
        domain::HistoryAction::Escalated => ApprovalAction::Escalated,
    }
}

pub(crate) const fn db_rule_type_to_core(rule_type: ApprovalRuleType) -> domain::RuleType {
    match rule_type {
        ApprovalRuleType::Percentage => domain::RuleType::Percentage,
        ApprovalRuleType::SpecificApprover => domain::RuleType::SpecificApprover,
        ApprovalRuleType::Hybrid => domain::RuleType::Hybrid,
    }
}

pub(crate) const fn core_rule_type_to_db(rule_type: domain::RuleType) -> ApprovalRuleType {
    match rule_type {
        domain::RuleType::Percentage => ApprovalRuleType::Percentage,
        domain::RuleType::SpecificApprover => ApprovalRuleType::SpecificApprover,
        domain::RuleType::Hybrid => ApprovalRuleType::Hybrid,
    }
}

/// Trimmed `value`, or a validation error naming `field` when blank.
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, RepositoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApprovalError::Validation(format!("{field} is required")).into());
    }
    Ok(trimmed.to_string())
}

fn utc(ts: DateTimeWithTimeZone) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

fn currency(code: &str) -> Result<CurrencyCode, RepositoryError> {
    CurrencyCode::parse(code).map_err(RepositoryError::InvalidData)
}

pub(crate) fn company_from_model(model: companies::Model) -> Result<Company, RepositoryError> {
    Ok(Company {
        id: model.id.into(),
        currency: currency(&model.currency)?,
        name: model.name,
        country: model.country,
    })
}

pub(crate) fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id.into(),
        company_id: model.company_id.into(),
        name: model.name,
        email: model.email,
        role: db_role_to_core(model.role),
        manager_id: model.manager_id.map(Into::into),
        is_manager_approver: model.is_manager_approver,
        is_active: model.is_active,
    }
}

pub(crate) fn expense_from_model(model: expenses::Model) -> Result<Expense, RepositoryError> {
    Ok(Expense {
        id: model.id.into(),
        company_id: model.company_id.into(),
        employee_id: model.employee_id.into(),
        amount: model.amount,
        currency: currency(&model.currency)?,
        converted_amount: model.converted_amount,
        category: model.category,
        description: model.description,
        expense_date: model.expense_date,
        status: db_status_to_core(model.status),
        approval_step: model.approval_step,
        current_approver_id: model.current_approver_id.map(Into::into),
        version: model.version,
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

pub(crate) fn steps_from_json(steps: &Json) -> Result<Vec<ApprovalStep>, RepositoryError> {
    serde_json::from_value(steps.clone())
        .map_err(|e| RepositoryError::InvalidData(format!("approval flow steps: {e}")))
}

pub(crate) fn steps_to_json(steps: &[ApprovalStep]) -> Result<Json, RepositoryError> {
    serde_json::to_value(steps)
        .map_err(|e| RepositoryError::InvalidData(format!("approval flow steps: {e}")))
}

pub(crate) fn flow_from_model(model: approval_flows::Model) -> Result<ApprovalFlow, RepositoryError> {
    Ok(ApprovalFlow {
        id: model.id.into(),
        company_id: model.company_id.into(),
        steps: steps_from_json(&model.steps)?,
        name: model.name,
        min_amount: model.min_amount,
        max_amount: model.max_amount,
        is_active: model.is_active,
        created_at: utc(model.created_at),
    })
}

pub(crate) fn rule_from_model(model: approval_rules::Model) -> ApprovalRule {
    ApprovalRule {
        id: model.id.into(),
        company_id: model.company_id.into(),
        name: model.name,
        rule_type: db_rule_type_to_core(model.rule_type),
        approval_percentage: model.approval_percentage,
        specific_approver_id: model.specific_approver_id.map(Into::into),
        min_amount: model.min_amount,
        max_amount: model.max_amount,
        is_active: model.is_active,
        approval_flow_id: model.approval_flow_id.map(Into::into),
        created_at: utc(model.created_at),
    }
}

pub(crate) fn history_from_model(model: approval_history::Model) -> HistoryEntry {
    HistoryEntry {
        id: model.id.into(),
        expense_id: model.expense_id.into(),
        approver_id: model.approver_id.into(),
        action: db_action_to_core(model.action),
        comments: model.comments,
        step: model.step,
        created_at: utc(model.created_at),
    }
}

pub(crate) fn history_active_model(entry: &HistoryEntry) -> approval_history::ActiveModel {
    approval_history::ActiveModel {
        id: Set(entry.id.into_inner()),
        expense_id: Set(entry.expense_id.into_inner()),
        approver_id: Set(entry.approver_id.into_inner()),
        action: Set(core_action_to_db(entry.action)),
        comments: Set(entry.comments.clone()),
        step: Set(entry.step),
        created_at: Set(entry.created_at.into()),
    }
}
