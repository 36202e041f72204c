//! Approval policy resolution.
//!
//! Picks the single flow or rule governing an expense from the company's
//! configured policies and its converted amount.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use reimburse_shared::types::CompanyId;
use rust_decimal::Decimal;

use super::model::{ApprovalFlow, ApprovalRule};

/// Policy governing an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMatch<'a> {
    /// A conditional rule, with the approver sequence it rides on.
    Rule {
        /// The matched rule.
        rule: &'a ApprovalRule,
        /// Linked flow, or the band-matching flow when none is linked.
        sequence: Option<&'a ApprovalFlow>,
    },
    /// A sequential flow with no rule on top.
    Flow(&'a ApprovalFlow),
}

impl<'a> PolicyMatch<'a> {
    /// Approver sequence for this policy, if any.
    #[must_use]
    pub const fn sequence(&self) -> Option<&'a ApprovalFlow> {
        match self {
            Self::Rule { sequence, .. } => *sequence,
            Self::Flow(flow) => Some(flow),
        }
    }
}

/// Shared band predicate: active and `min <= amount <= max` (max optional).
fn in_band(is_active: bool, min: Decimal, max: Option<Decimal>, amount: Decimal) -> bool {
    is_active && min <= amount && max.is_none_or(|max| max >= amount)
}

/// Ordering key: highest `min_amount` first, then oldest, then lowest ID.
fn by_specificity<I: Ord>(
    a: (Decimal, DateTime<Utc>, I),
    b: (Decimal, DateTime<Utc>, I),
) -> Ordering {
    b.0.cmp(&a.0)
        .then_with(|| a.1.cmp(&b.1))
        .then_with(|| a.2.cmp(&b.2))
}

/// A company's configured flows and rules.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    flows: Vec<ApprovalFlow>,
    rules: Vec<ApprovalRule>,
}

impl PolicySet {
    /// Creates a policy set.
    #[must_use]
    pub const fn new(flows: Vec<ApprovalFlow>, rules: Vec<ApprovalRule>) -> Self {
        Self { flows, rules }
    }

    /// All flows.
    #[must_use]
    pub fn flows(&self) -> &[ApprovalFlow] {
        &self.flows
    }

    /// All rules.
    #[must_use]
    pub fn rules(&self) -> &[ApprovalRule] {
        &self.rules
    }

    /// Best active flow whose band contains `amount`.
    #[must_use]
    pub fn matching_flow(&self, company_id: CompanyId, amount: Decimal) -> Option<&ApprovalFlow> {
        self.flows
            .iter()
            .filter(|f| f.company_id == company_id)
            .filter(|f| in_band(f.is_active, f.min_amount, f.max_amount, amount))
            .min_by(|a, b| {
                by_specificity(
                    (a.min_amount, a.created_at, a.id),
                    (b.min_amount, b.created_at, b.id),
                )
            })
    }

    /// Best active rule whose band contains `amount`.
    #[must_use]
    pub fn matching_rule(&self, company_id: CompanyId, amount: Decimal) -> Option<&ApprovalRule> {
        self.rules
            .iter()
            .filter(|r| r.company_id == company_id)
            .filter(|r| in_band(r.is_active, r.min_amount, r.max_amount, amount))
            .min_by(|a, b| {
                by_specificity(
                    (a.min_amount, a.created_at, a.id),
                    (b.min_amount, b.created_at, b.id),
                )
            })
    }

    /// Resolves the governing policy. Rules take precedence over flows.
    #[must_use]
    pub fn resolve(&self, company_id: CompanyId, amount: Decimal) -> Option<PolicyMatch<'_>> {
        if let Some(rule) = self.matching_rule(company_id, amount) {
            let sequence = self
                .linked_flow(rule)
                .or_else(|| self.matching_flow(company_id, amount));
            return Some(PolicyMatch::Rule { rule, sequence });
        }
        self.matching_flow(company_id, amount).map(PolicyMatch::Flow)
    }

    /// Approver sequence an expense walks through, regardless of rule outcome.
    #[must_use]
    pub fn approval_sequence(
        &self,
        company_id: CompanyId,
        amount: Decimal,
    ) -> Option<&ApprovalFlow> {
        self.resolve(company_id, amount)
            .and_then(|policy| policy.sequence())
    }

    /// The rule's linked flow, if it exists in the company and is active.
    #[must_use]
    pub fn linked_flow(&self, rule: &ApprovalRule) -> Option<&ApprovalFlow> {
        let flow_id = rule.approval_flow_id?;
        self.flows
            .iter()
            .find(|f| f.id == flow_id && f.company_id == rule.company_id && f.is_active)
    }
}
