//! Test builders for a single company.

use chrono::{NaiveDate, Utc};
use reimburse_shared::types::{
    ApprovalFlowId, ApprovalRuleId, CompanyId, CurrencyCode, ExpenseId, UserId,
};
use rust_decimal::Decimal;

use super::directory::UserDirectory;
use super::model::{Actor, ApprovalFlow, ApprovalRule, ApprovalStep, Expense, User};
use super::resolver::PolicySet;
use super::types::{ExpenseStatus, RuleType, UserRole};

pub(crate) struct World {
    pub company: CompanyId,
    pub directory: UserDirectory,
    pub flows: Vec<ApprovalFlow>,
    pub rules: Vec<ApprovalRule>,
}

impl World {
    pub fn new() -> Self {
        Self {
            company: CompanyId::new(),
            directory: UserDirectory::new(),
            flows: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn add_user(
        &mut self,
        role: UserRole,
        manager_id: Option<UserId>,
        is_manager_approver: bool,
    ) -> UserId {
        let id = UserId::new();
        self.directory.insert(User {
            id,
            company_id: self.company,
            name: format!("{role} {id}"),
            email: format!("{id}@example.com"),
            role,
            manager_id,
            is_manager_approver,
            is_active: true,
        });
        id
    }

    pub fn employee(&mut self) -> UserId {
        self.add_user(UserRole::Employee, None, false)
    }

    pub fn manager(&mut self) -> UserId {
        self.add_user(UserRole::Manager, None, true)
    }

    pub fn admin(&mut self) -> UserId {
        self.add_user(UserRole::Admin, None, false)
    }

    pub fn add_flow(
        &mut self,
        approvers: &[UserId],
        min_amount: Decimal,
        max_amount: Option<Decimal>,
    ) -> ApprovalFlowId {
        let id = ApprovalFlowId::new();
        self.flows.push(ApprovalFlow {
            id,
            company_id: self.company,
            name: format!("flow {min_amount}"),
            steps: (1..)
                .zip(approvers)
                .map(|(order, approver_id)| ApprovalStep {
                    order,
                    name: format!("Step {order}"),
                    approver_id: *approver_id,
                })
                .collect(),
            min_amount,
            max_amount,
            is_active: true,
            created_at: Utc::now(),
        });
        id
    }

    pub fn add_rule(
        &mut self,
        rule_type: RuleType,
        approval_percentage: Option<i32>,
        specific_approver_id: Option<UserId>,
        approval_flow_id: Option<ApprovalFlowId>,
    ) -> ApprovalRuleId {
        let id = ApprovalRuleId::new();
        self.rules.push(ApprovalRule {
            id,
            company_id: self.company,
            name: format!("{rule_type} rule"),
            rule_type,
            approval_percentage,
            specific_approver_id,
            min_amount: Decimal::ZERO,
            max_amount: None,
            is_active: true,
            approval_flow_id,
            created_at: Utc::now(),
        });
        id
    }

    pub fn policies(&self) -> PolicySet {
        PolicySet::new(self.flows.clone(), self.rules.clone())
    }

    pub fn expense(&self, employee_id: UserId, amount: Decimal) -> Expense {
        let now = Utc::now();
        Expense {
            id: ExpenseId::new(),
            company_id: self.company,
            employee_id,
            amount,
            currency: CurrencyCode::USD,
            converted_amount: amount,
            category: "Travel".to_string(),
            description: None,
            expense_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap_or_default(),
            status: ExpenseStatus::Pending,
            approval_step: 0,
            current_approver_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn actor(&self, id: UserId) -> Actor {
        let role = self
            .directory
            .get(id)
            .map_or(UserRole::Employee, |u| u.role);
        Actor {
            id,
            role,
            company_id: self.company,
        }
    }
}
