//! Input validation for expenses, flows, rules and users.
//!
//! Validation happens before anything is written; every failure is an
//! `ApprovalError::Validation` with a message fit for the caller.

use chrono::NaiveDate;
use reimburse_shared::types::{ApprovalFlowId, CompanyId, CurrencyCode, UserId};
use rust_decimal::Decimal;

use crate::currency::MAX_AMOUNT;

use super::directory::UserDirectory;
use super::error::ApprovalError;
use super::model::{ApprovalFlow, ApprovalStep};
use super::types::{RuleType, UserRole};

fn invalid(message: impl Into<String>) -> ApprovalError {
    ApprovalError::Validation(message.into())
}

fn trimmed_non_empty(value: &str, field: &str) -> Result<String, ApprovalError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Expense fields supplied at submission.
#[derive(Debug, Clone)]
pub struct NewExpense {
    /// Amount in `currency`.
    pub amount: Option<Decimal>,
    /// Three-letter currency code.
    pub currency: String,
    /// Category label.
    pub category: String,
    /// Optional free text.
    pub description: Option<String>,
    /// Date incurred.
    pub expense_date: Option<NaiveDate>,
}

/// Submission after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidExpense {
    /// Positive amount.
    pub amount: Decimal,
    /// Parsed currency.
    pub currency: CurrencyCode,
    /// Trimmed category.
    pub category: String,
    /// Trimmed description, `None` when blank.
    pub description: Option<String>,
    /// Date incurred.
    pub expense_date: NaiveDate,
}

/// Validates an expense submission.
///
/// # Errors
///
/// Returns `ApprovalError::Validation` for a missing, non-positive or too
/// large amount, more than two decimal places, a malformed currency, a blank
/// category or a missing date.
pub fn validate_expense(input: &NewExpense) -> Result<ValidExpense, ApprovalError> {
    let amount = input.amount.ok_or_else(|| invalid("amount is required"))?;
    if amount <= Decimal::ZERO {
        return Err(invalid("amount must be greater than zero"));
    }
    if amount.normalize().scale() > 2 {
        return Err(invalid("amount must have at most two decimal places"));
    }
    if amount > MAX_AMOUNT {
        return Err(invalid(format!("amount must not exceed {MAX_AMOUNT}")));
    }
    let currency = CurrencyCode::parse(&input.currency).map_err(invalid)?;
    let category = trimmed_non_empty(&input.category, "category")?;
    let expense_date = input
        .expense_date
        .ok_or_else(|| invalid("expense_date is required"))?;

    Ok(ValidExpense {
        amount,
        currency,
        category,
        description: optional_text(input.description.as_deref()),
        expense_date,
    })
}

/// Checks an amount band and applies the default minimum of zero.
///
/// # Errors
///
/// Returns `ApprovalError::Validation` for negative bounds, bounds above
/// [`MAX_AMOUNT`] or `max < min`.
pub fn validate_band(
    min_amount: Option<Decimal>,
    max_amount: Option<Decimal>,
) -> Result<(Decimal, Option<Decimal>), ApprovalError> {
    let min = min_amount.unwrap_or(Decimal::ZERO);
    if min < Decimal::ZERO {
        return Err(invalid("min_amount must not be negative"));
    }
    if min > MAX_AMOUNT || max_amount.is_some_and(|max| max > MAX_AMOUNT) {
        return Err(invalid(format!("amount bounds must not exceed {MAX_AMOUNT}")));
    }
    if let Some(max) = max_amount
        && max < min
    {
        return Err(invalid("max_amount must be greater than or equal to min_amount"));
    }
    Ok((min, max_amount))
}

/// One step as supplied by an admin.
#[derive(Debug, Clone)]
pub struct StepInput {
    /// Step label.
    pub name: String,
    /// Approver at this step.
    pub approver_id: UserId,
}

/// Approval flow fields supplied by an admin.
#[derive(Debug, Clone)]
pub struct FlowInput {
    /// Display name.
    pub name: String,
    /// Ordered steps.
    pub steps: Vec<StepInput>,
    /// Inclusive lower bound, default 0.
    pub min_amount: Option<Decimal>,
    /// Inclusive upper bound.
    pub max_amount: Option<Decimal>,
    /// Active flag, default true.
    pub is_active: Option<bool>,
}

/// Flow after validation, steps numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFlow {
    /// Display name.
    pub name: String,
    /// Numbered steps.
    pub steps: Vec<ApprovalStep>,
    /// Lower bound.
    pub min_amount: Decimal,
    /// Upper bound.
    pub max_amount: Option<Decimal>,
    /// Active flag.
    pub is_active: bool,
}

/// Validates an approval flow against the company's users.
///
/// # Errors
///
/// Returns `ApprovalError::Validation` for an empty name or step list, a
/// blank step name, an approver who cannot approve in this company or a bad
/// amount band.
pub fn validate_flow(
    input: &FlowInput,
    company_id: CompanyId,
    directory: &UserDirectory,
) -> Result<ValidFlow, ApprovalError> {
    let name = trimmed_non_empty(&input.name, "name")?;
    if input.steps.is_empty() {
        return Err(invalid("Steps must be a non-empty array"));
    }

    let mut steps = Vec::with_capacity(input.steps.len());
    for (order, step) in (1..).zip(&input.steps) {
        let step_name = step.name.trim();
        if step_name.is_empty() {
            return Err(invalid("Each step must have approver_id and name"));
        }
        if !directory.can_approve(step.approver_id, company_id) {
            return Err(invalid(format!(
                "Step {order} approver must be an active manager or admin in the same company"
            )));
        }
        steps.push(ApprovalStep {
            order,
            name: step_name.to_string(),
            approver_id: step.approver_id,
        });
    }

    let (min_amount, max_amount) = validate_band(input.min_amount, input.max_amount)?;

    Ok(ValidFlow {
        name,
        steps,
        min_amount,
        max_amount,
        is_active: input.is_active.unwrap_or(true),
    })
}

/// Approval rule fields supplied by an admin.
#[derive(Debug, Clone)]
pub struct RuleInput {
    /// Display name.
    pub name: String,
    /// Rule kind.
    pub rule_type: RuleType,
    /// Required percentage for percentage/hybrid rules.
    pub approval_percentage: Option<i32>,
    /// Required approver for specific_approver/hybrid rules.
    pub specific_approver_id: Option<UserId>,
    /// Inclusive lower bound, default 0.
    pub min_amount: Option<Decimal>,
    /// Inclusive upper bound.
    pub max_amount: Option<Decimal>,
    /// Active flag, default true.
    pub is_active: Option<bool>,
    /// Flow the rule rides on.
    pub approval_flow_id: Option<ApprovalFlowId>,
}

/// Rule after validation. Fields the rule type does not use are cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRule {
    /// Display name.
    pub name: String,
    /// Rule kind.
    pub rule_type: RuleType,
    /// Set iff the type uses a percentage.
    pub approval_percentage: Option<i32>,
    /// Set iff the type uses a specific approver.
    pub specific_approver_id: Option<UserId>,
    /// Lower bound.
    pub min_amount: Decimal,
    /// Upper bound.
    pub max_amount: Option<Decimal>,
    /// Active flag.
    pub is_active: bool,
    /// Linked flow.
    pub approval_flow_id: Option<ApprovalFlowId>,
}

/// Validates an approval rule against the company's users and flows.
///
/// # Errors
///
/// Returns `ApprovalError::Validation` when a field required by the rule
/// type is missing or out of range, or a referenced user/flow is not in the
/// company.
pub fn validate_rule(
    input: &RuleInput,
    company_id: CompanyId,
    directory: &UserDirectory,
    flows: &[ApprovalFlow],
) -> Result<ValidRule, ApprovalError> {
    let name = trimmed_non_empty(&input.name, "name")?;

    let approval_percentage = if input.rule_type.uses_percentage() {
        let pct = input
            .approval_percentage
            .ok_or_else(|| invalid("approval_percentage is required for this rule type"))?;
        if !(1..=100).contains(&pct) {
            return Err(invalid("approval_percentage must be between 1 and 100"));
        }
        Some(pct)
    } else {
        None
    };

    let specific_approver_id = if input.rule_type.uses_specific_approver() {
        let approver = input
            .specific_approver_id
            .ok_or_else(|| invalid("specific_approver_id is required for this rule type"))?;
        if !directory.can_approve(approver, company_id) {
            return Err(invalid(
                "Specific approver must be an active manager or admin in the same company",
            ));
        }
        Some(approver)
    } else {
        None
    };

    if let Some(flow_id) = input.approval_flow_id
        && !flows
            .iter()
            .any(|f| f.id == flow_id && f.company_id == company_id)
    {
        return Err(invalid("Linked approval flow not found"));
    }

    let (min_amount, max_amount) = validate_band(input.min_amount, input.max_amount)?;

    Ok(ValidRule {
        name,
        rule_type: input.rule_type,
        approval_percentage,
        specific_approver_id,
        min_amount,
        max_amount,
        is_active: input.is_active.unwrap_or(true),
        approval_flow_id: input.approval_flow_id,
    })
}

/// `is_manager_approver` only sticks for managers.
#[must_use]
pub fn effective_manager_approver(role: UserRole, requested: bool) -> bool {
    role == UserRole::Manager && requested
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::model::User;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn member(company_id: CompanyId) -> User {
        User {
            id: UserId::new(),
            company_id,
            name: "Approver".to_string(),
            email: "approver@example.com".to_string(),
            role: UserRole::Manager,
            manager_id: None,
            is_manager_approver: true,
            is_active: true,
        }
    }

    fn expense_input() -> NewExpense {
        NewExpense {
            amount: Some(dec!(42.50)),
            currency: "eur".to_string(),
            category: "  Meals ".to_string(),
            description: Some("   ".to_string()),
            expense_date: NaiveDate::from_ymd_opt(2026, 3, 14),
        }
    }

    #[test]
    fn test_validate_expense_normalizes() {
        let valid = validate_expense(&expense_input()).unwrap();
        assert_eq!(valid.currency, CurrencyCode::EUR);
        assert_eq!(valid.category, "Meals");
        assert_eq!(valid.description, None);
    }

    #[test]
    fn test_validate_expense_rejects_bad_fields() {
        let mut input = expense_input();
        input.amount = Some(dec!(0));
        assert!(validate_expense(&input).is_err());

        let mut input = expense_input();
        input.amount = None;
        assert!(validate_expense(&input).is_err());

        let mut input = expense_input();
        input.amount = Some(dec!(10.005));
        assert!(validate_expense(&input).is_err());

        let mut input = expense_input();
        input.amount = Some(dec!(10.500));
        assert!(validate_expense(&input).is_ok());

        let mut input = expense_input();
        input.currency = "EURO".to_string();
        assert!(validate_expense(&input).is_err());

        let mut input = expense_input();
        input.category = String::new();
        assert!(validate_expense(&input).is_err());

        let mut input = expense_input();
        input.expense_date = None;
        assert!(validate_expense(&input).is_err());
    }

    #[test]
    fn test_validate_expense_caps_amount_at_column_precision() {
        let mut input = expense_input();
        input.amount = Some(MAX_AMOUNT);
        assert!(validate_expense(&input).is_ok());

        input.amount = Some(dec!(10000000000000));
        assert!(validate_expense(&input).is_err());

        input.amount = Some(dec!(1000000000000000000000000000));
        assert!(validate_expense(&input).is_err());
    }

    #[test]
    fn test_validate_band() {
        assert_eq!(validate_band(None, None).unwrap(), (Decimal::ZERO, None));
        assert!(validate_band(Some(dec!(-1)), None).is_err());
        assert!(validate_band(Some(dec!(100)), Some(dec!(50))).is_err());
        assert_eq!(
            validate_band(Some(dec!(100)), Some(dec!(100))).unwrap(),
            (dec!(100), Some(dec!(100)))
        );
        assert!(validate_band(Some(dec!(10000000000000)), None).is_err());
        assert!(validate_band(None, Some(dec!(10000000000000))).is_err());
        assert!(validate_band(None, Some(MAX_AMOUNT)).is_ok());
    }

    #[test]
    fn test_validate_flow_numbers_steps() {
        let company = CompanyId::new();
        let a = member(company);
        let b = member(company);
        let directory: UserDirectory = [a.clone(), b.clone()].into_iter().collect();

        let flow = validate_flow(
            &FlowInput {
                name: "Two step".to_string(),
                steps: vec![
                    StepInput {
                        name: "Manager".to_string(),
                        approver_id: a.id,
                    },
                    StepInput {
                        name: "Finance".to_string(),
                        approver_id: b.id,
                    },
                ],
                min_amount: None,
                max_amount: None,
                is_active: None,
            },
            company,
            &directory,
        )
        .unwrap();

        assert_eq!(flow.steps.len(), 2);
        assert_eq!(flow.steps[0].order, 1);
        assert_eq!(flow.steps[1].order, 2);
        assert_eq!(flow.steps[1].approver_id, b.id);
        assert!(flow.is_active);
    }

    #[test]
    fn test_validate_flow_rejects_empty_and_foreign_steps() {
        let company = CompanyId::new();
        let outsider = member(CompanyId::new());
        let directory: UserDirectory = [outsider.clone()].into_iter().collect();

        let mut input = FlowInput {
            name: "Flow".to_string(),
            steps: vec![],
            min_amount: None,
            max_amount: None,
            is_active: None,
        };
        assert!(validate_flow(&input, company, &directory).is_err());

        input.steps.push(StepInput {
            name: "Outsider".to_string(),
            approver_id: outsider.id,
        });
        assert!(validate_flow(&input, company, &directory).is_err());
    }

    #[test]
    fn test_validate_flow_rejects_non_approver_steps() {
        let company = CompanyId::new();
        let employee = User {
            role: UserRole::Employee,
            ..member(company)
        };
        let inactive = User {
            is_active: false,
            ..member(company)
        };
        let admin = User {
            role: UserRole::Admin,
            ..member(company)
        };
        let directory: UserDirectory = [employee.clone(), inactive.clone(), admin.clone()]
            .into_iter()
            .collect();
        let flow_with = |approver_id| FlowInput {
            name: "Flow".to_string(),
            steps: vec![StepInput {
                name: "Step".to_string(),
                approver_id,
            }],
            min_amount: None,
            max_amount: None,
            is_active: None,
        };

        assert!(validate_flow(&flow_with(employee.id), company, &directory).is_err());
        assert!(validate_flow(&flow_with(inactive.id), company, &directory).is_err());
        assert!(validate_flow(&flow_with(admin.id), company, &directory).is_ok());
    }

    #[test]
    fn test_validate_rule_rejects_employee_specific_approver() {
        let company = CompanyId::new();
        let employee = User {
            role: UserRole::Employee,
            ..member(company)
        };
        let directory: UserDirectory = [employee.clone()].into_iter().collect();
        let input = RuleInput {
            name: "Rule".to_string(),
            rule_type: RuleType::SpecificApprover,
            approval_percentage: None,
            specific_approver_id: Some(employee.id),
            min_amount: None,
            max_amount: None,
            is_active: None,
            approval_flow_id: None,
        };
        assert!(validate_rule(&input, company, &directory, &[]).is_err());
    }

    #[test]
    fn test_validate_rule_requirements() {
        let company = CompanyId::new();
        let x = member(company);
        let directory: UserDirectory = [x.clone()].into_iter().collect();
        let base = RuleInput {
            name: "Rule".to_string(),
            rule_type: RuleType::Percentage,
            approval_percentage: None,
            specific_approver_id: Some(x.id),
            min_amount: None,
            max_amount: None,
            is_active: None,
            approval_flow_id: None,
        };

        assert!(validate_rule(&base, company, &directory, &[]).is_err());

        let pct = RuleInput {
            approval_percentage: Some(101),
            ..base.clone()
        };
        assert!(validate_rule(&pct, company, &directory, &[]).is_err());

        let pct = RuleInput {
            approval_percentage: Some(60),
            ..base.clone()
        };
        let valid = validate_rule(&pct, company, &directory, &[]).unwrap();
        assert_eq!(valid.approval_percentage, Some(60));
        assert_eq!(valid.specific_approver_id, None);

        let specific = RuleInput {
            rule_type: RuleType::SpecificApprover,
            specific_approver_id: None,
            ..base.clone()
        };
        assert!(validate_rule(&specific, company, &directory, &[]).is_err());

        let hybrid = RuleInput {
            rule_type: RuleType::Hybrid,
            approval_percentage: Some(50),
            ..base
        };
        let valid = validate_rule(&hybrid, company, &directory, &[]).unwrap();
        assert_eq!(valid.specific_approver_id, Some(x.id));
    }

    #[test]
    fn test_validate_rule_linked_flow_must_exist() {
        let company = CompanyId::new();
        let directory = UserDirectory::new();
        let flow = ApprovalFlow {
            id: ApprovalFlowId::new(),
            company_id: company,
            name: "Flow".to_string(),
            steps: vec![],
            min_amount: Decimal::ZERO,
            max_amount: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let input = RuleInput {
            name: "Rule".to_string(),
            rule_type: RuleType::Percentage,
            approval_percentage: Some(50),
            specific_approver_id: None,
            min_amount: None,
            max_amount: None,
            is_active: None,
            approval_flow_id: Some(ApprovalFlowId::new()),
        };
        assert!(validate_rule(&input, company, &directory, &[flow.clone()]).is_err());

        let linked = RuleInput {
            approval_flow_id: Some(flow.id),
            ..input
        };
        assert!(validate_rule(&linked, company, &directory, &[flow]).is_ok());
    }

    #[test]
    fn test_effective_manager_approver() {
        assert!(effective_manager_approver(UserRole::Manager, true));
        assert!(!effective_manager_approver(UserRole::Employee, true));
        assert!(!effective_manager_approver(UserRole::Admin, true));
        assert!(!effective_manager_approver(UserRole::Manager, false));
    }
}
