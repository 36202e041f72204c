//! Approval state machine.
//!
//! The engine is pure: it reads an expense, the company's policies, the user
//! directory and the history ledger, and returns the `Transition` to persist.
//! Persisting the transition (and its history entry) atomically is the
//! caller's job.

use chrono::Utc;
use reimburse_shared::ManagerFlagLocation;
use reimburse_shared::types::UserId;

use super::directory::UserDirectory;
use super::error::ApprovalError;
use super::ledger::{HistoryLedger, override_comment};
use super::model::{Actor, ApprovalFlow, ApprovalRule, ApprovalStep, Expense, HistoryEntry, User};
use super::resolver::{PolicyMatch, PolicySet};
use super::types::{ApprovalDecision, ExpenseStatus, HistoryAction, RuleType, UserRole};

/// Why a transition ended where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingOutcome {
    /// Routed to the first approver (flow step or manager).
    AssignedApprover {
        /// Approver now holding the expense.
        approver_id: UserId,
    },
    /// Moved to the next step of the approver sequence.
    Advanced {
        /// Approver now holding the expense.
        approver_id: UserId,
        /// New step counter.
        step: i32,
    },
    /// Sequence exhausted; handed to the rule's specific approver.
    HandedToSpecificApprover {
        /// The rule's specific approver.
        approver_id: UserId,
    },
    /// Conditional rule not met yet; the current approver keeps the expense.
    AwaitingRule,
    /// Final step approved or conditional rule satisfied.
    Approved,
    /// Nobody is left to approve.
    AutoApproved,
    /// The current approver rejected.
    Rejected,
    /// An admin forced a terminal status.
    Overridden {
        /// Forced decision.
        decision: ApprovalDecision,
    },
    /// The chosen approver does not exist; auto-approved instead of stranding
    /// the expense. Callers must surface this to operators.
    StaleApprover {
        /// Missing approver ID.
        approver_id: UserId,
    },
}

/// New routing state for an expense, plus the history entry recorded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// New status.
    pub status: ExpenseStatus,
    /// New current approver.
    pub current_approver_id: Option<UserId>,
    /// New step counter.
    pub approval_step: i32,
    /// Entry appended to the ledger by this transition, if any.
    pub history: Option<HistoryEntry>,
    /// Why the expense ended up here.
    pub outcome: RoutingOutcome,
}

impl Transition {
    fn pending(approver_id: UserId, approval_step: i32, outcome: RoutingOutcome) -> Self {
        Self {
            status: ExpenseStatus::Pending,
            current_approver_id: Some(approver_id),
            approval_step,
            history: None,
            outcome,
        }
    }

    fn terminal(status: ExpenseStatus, approval_step: i32, outcome: RoutingOutcome) -> Self {
        Self {
            status,
            current_approver_id: None,
            approval_step,
            history: None,
            outcome,
        }
    }

    fn with_history(mut self, entry: HistoryEntry) -> Self {
        self.history = Some(entry);
        self
    }

    /// Applies the transition to an in-memory expense and bumps its version.
    pub fn apply(&self, expense: &mut Expense) {
        expense.status = self.status;
        expense.current_approver_id = self.current_approver_id;
        expense.approval_step = self.approval_step;
        expense.version += 1;
        expense.updated_at = Utc::now();
    }

    /// Returns true if the transition fell back past a missing approver.
    #[must_use]
    pub fn is_stale_fallback(&self) -> bool {
        matches!(self.outcome, RoutingOutcome::StaleApprover { .. })
    }
}

/// Returns true if `approvals` out of `total` reaches `required` percent.
///
/// Integer arithmetic: `approvals * 100 >= required * total`.
#[must_use]
pub fn percentage_met(approvals: usize, total: usize, required: i32) -> bool {
    let (Ok(approvals), Ok(total), Ok(required)) = (
        u64::try_from(approvals),
        u64::try_from(total),
        u64::try_from(required),
    ) else {
        return false;
    };
    approvals.saturating_mul(100) >= required.saturating_mul(total)
}

/// Evaluates a conditional rule after `actor_id` approved.
#[must_use]
pub fn rule_satisfied(
    rule: &ApprovalRule,
    actor_id: UserId,
    approvals: usize,
    total: usize,
) -> bool {
    let by_percentage = rule
        .approval_percentage
        .is_some_and(|required| percentage_met(approvals, total, required));
    let by_approver = rule.specific_approver_id == Some(actor_id);

    match rule.rule_type {
        RuleType::Percentage => by_percentage,
        RuleType::SpecificApprover => by_approver,
        RuleType::Hybrid => by_percentage || by_approver,
    }
}

/// Step after `approval_step` steps have been entered.
fn next_step(flow: &ApprovalFlow, approval_step: i32) -> Option<&ApprovalStep> {
    usize::try_from(approval_step)
        .ok()
        .and_then(|index| flow.steps.get(index))
}

/// Routing engine over one company's policies and users.
#[derive(Debug, Clone, Copy)]
pub struct ApprovalEngine<'a> {
    policies: &'a PolicySet,
    directory: &'a UserDirectory,
    manager_flag: ManagerFlagLocation,
}

impl<'a> ApprovalEngine<'a> {
    /// Creates an engine reading the manager-approver flag from the manager.
    #[must_use]
    pub const fn new(policies: &'a PolicySet, directory: &'a UserDirectory) -> Self {
        Self {
            policies,
            directory,
            manager_flag: ManagerFlagLocation::Manager,
        }
    }

    /// Selects whose `is_manager_approver` flag gates manager routing.
    #[must_use]
    pub const fn with_manager_flag(mut self, manager_flag: ManagerFlagLocation) -> Self {
        self.manager_flag = manager_flag;
        self
    }

    /// Initial routing for a freshly created expense.
    ///
    /// Order: first step of the approver sequence, then the submitter's
    /// manager, then auto-approval.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::ReferenceIntegrity` if the submitting employee
    /// is not in the directory and `ApprovalError::Validation` if the expense
    /// was already routed.
    pub fn submit(&self, expense: &Expense) -> Result<Transition, ApprovalError> {
        if expense.status != ExpenseStatus::Pending
            || expense.current_approver_id.is_some()
            || expense.approval_step != 0
        {
            return Err(ApprovalError::Validation(
                "Expense has already been routed".to_string(),
            ));
        }

        let employee = self
            .directory
            .get(expense.employee_id)
            .filter(|u| u.company_id == expense.company_id)
            .ok_or_else(|| {
                ApprovalError::ReferenceIntegrity("Submitting employee does not exist".to_string())
            })?;

        if let Some(flow) = self
            .policies
            .approval_sequence(expense.company_id, expense.converted_amount)
            && let Some(first) = flow.steps.first()
        {
            return Ok(self.route_or_auto_approve(
                expense,
                first.approver_id,
                1,
                RoutingOutcome::AssignedApprover {
                    approver_id: first.approver_id,
                },
            ));
        }

        if let Some(manager_id) = employee.manager_id
            && self.manager_routing_enabled(employee)
        {
            return Ok(self.route_or_auto_approve(
                expense,
                manager_id,
                0,
                RoutingOutcome::AssignedApprover {
                    approver_id: manager_id,
                },
            ));
        }

        Ok(Transition::terminal(
            ExpenseStatus::Approved,
            0,
            RoutingOutcome::AutoApproved,
        ))
    }

    /// Dispatches an approver's decision.
    ///
    /// # Errors
    ///
    /// See [`Self::approve`] and [`Self::reject`].
    pub fn act(
        &self,
        expense: &Expense,
        actor: &Actor,
        decision: ApprovalDecision,
        ledger: &mut HistoryLedger,
        comments: Option<String>,
    ) -> Result<Transition, ApprovalError> {
        match decision {
            ApprovalDecision::Approved => self.approve(expense, actor, ledger, comments),
            ApprovalDecision::Rejected => self.reject(expense, actor, ledger, comments),
        }
    }

    /// Records an approval by the current approver and decides what follows.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::InvalidApprovalTarget` unless the expense is
    /// pending and assigned to `actor`.
    pub fn approve(
        &self,
        expense: &Expense,
        actor: &Actor,
        ledger: &mut HistoryLedger,
        comments: Option<String>,
    ) -> Result<Transition, ApprovalError> {
        Self::guard(expense, actor)?;

        let entry = ledger
            .record(
                expense.id,
                actor.id,
                HistoryAction::Approved,
                expense.approval_step,
                comments,
            )
            .clone();

        let transition = match self
            .policies
            .resolve(expense.company_id, expense.converted_amount)
        {
            Some(PolicyMatch::Rule { rule, sequence }) => {
                self.evaluate_rule(expense, actor, rule, sequence, ledger)
            }
            Some(PolicyMatch::Flow(flow)) => self.advance_or_complete(expense, flow),
            None => Transition::terminal(
                ExpenseStatus::Approved,
                expense.approval_step,
                RoutingOutcome::AutoApproved,
            ),
        };

        Ok(transition.with_history(entry))
    }

    /// Records a rejection by the current approver. Rejection is always final.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::InvalidApprovalTarget` unless the expense is
    /// pending and assigned to `actor`.
    pub fn reject(
        &self,
        expense: &Expense,
        actor: &Actor,
        ledger: &mut HistoryLedger,
        comments: Option<String>,
    ) -> Result<Transition, ApprovalError> {
        Self::guard(expense, actor)?;

        let entry = ledger
            .record(
                expense.id,
                actor.id,
                HistoryAction::Rejected,
                expense.approval_step,
                comments,
            )
            .clone();

        Ok(Transition::terminal(
            ExpenseStatus::Rejected,
            expense.approval_step,
            RoutingOutcome::Rejected,
        )
        .with_history(entry))
    }

    /// Forces a terminal status, bypassing steps and rules.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::Forbidden` for non-admins and
    /// `ApprovalError::InvalidApprovalTarget` if the expense is not pending or
    /// belongs to another company.
    pub fn override_decision(
        &self,
        expense: &Expense,
        actor: &Actor,
        decision: ApprovalDecision,
        ledger: &mut HistoryLedger,
        comments: Option<&str>,
    ) -> Result<Transition, ApprovalError> {
        Self::ensure_can_override(actor)?;
        if expense.status != ExpenseStatus::Pending || expense.company_id != actor.company_id {
            return Err(ApprovalError::InvalidApprovalTarget);
        }

        let entry = ledger
            .record(
                expense.id,
                actor.id,
                decision.history_action(),
                expense.approval_step,
                Some(override_comment(comments)),
            )
            .clone();

        Ok(Transition::terminal(
            decision.terminal_status(),
            expense.approval_step,
            RoutingOutcome::Overridden { decision },
        )
        .with_history(entry))
    }

    /// Checks the actor's role before an override is attempted.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::Forbidden` for non-admins.
    pub fn ensure_can_override(actor: &Actor) -> Result<(), ApprovalError> {
        if actor.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ApprovalError::Forbidden(
                "Only admins can override approvals".to_string(),
            ))
        }
    }

    fn guard(expense: &Expense, actor: &Actor) -> Result<(), ApprovalError> {
        if expense.is_awaiting(actor) {
            Ok(())
        } else {
            Err(ApprovalError::InvalidApprovalTarget)
        }
    }

    fn manager_routing_enabled(&self, employee: &User) -> bool {
        match self.manager_flag {
            ManagerFlagLocation::Employee => employee.is_manager_approver,
            // A dangling manager link still routes, so the stale fallback reports it.
            ManagerFlagLocation::Manager => self
                .directory
                .manager_of(employee.id)
                .is_none_or(|manager| manager.is_manager_approver),
        }
    }

    fn route_or_auto_approve(
        &self,
        expense: &Expense,
        approver_id: UserId,
        step: i32,
        outcome: RoutingOutcome,
    ) -> Transition {
        if self.directory.can_approve(approver_id, expense.company_id) {
            Transition::pending(approver_id, step, outcome)
        } else {
            Transition::terminal(
                ExpenseStatus::Approved,
                expense.approval_step,
                RoutingOutcome::StaleApprover { approver_id },
            )
        }
    }

    fn advance_or_complete(&self, expense: &Expense, flow: &ApprovalFlow) -> Transition {
        match next_step(flow, expense.approval_step) {
            Some(next) => {
                let step = expense.approval_step + 1;
                self.route_or_auto_approve(
                    expense,
                    next.approver_id,
                    step,
                    RoutingOutcome::Advanced {
                        approver_id: next.approver_id,
                        step,
                    },
                )
            }
            None => Transition::terminal(
                ExpenseStatus::Approved,
                expense.approval_step,
                RoutingOutcome::Approved,
            ),
        }
    }

    fn evaluate_rule(
        &self,
        expense: &Expense,
        actor: &Actor,
        rule: &ApprovalRule,
        sequence: Option<&ApprovalFlow>,
        ledger: &HistoryLedger,
    ) -> Transition {
        let approvals = ledger.distinct_approvals(expense.id);
        let total = self
            .policies
            .linked_flow(rule)
            .map_or(1, |flow| flow.steps.len().max(1));

        if rule_satisfied(rule, actor.id, approvals, total) {
            return Transition::terminal(
                ExpenseStatus::Approved,
                expense.approval_step,
                RoutingOutcome::Approved,
            );
        }

        if let Some(flow) = sequence
            && next_step(flow, expense.approval_step).is_some()
        {
            return self.advance_or_complete(expense, flow);
        }

        if rule.rule_type.uses_specific_approver()
            && let Some(specific) = rule.specific_approver_id
            && specific != actor.id
            && !ledger.has_approved(expense.id, specific)
        {
            return self.route_or_auto_approve(
                expense,
                specific,
                expense.approval_step,
                RoutingOutcome::HandedToSpecificApprover {
                    approver_id: specific,
                },
            );
        }

        Transition::pending(actor.id, expense.approval_step, RoutingOutcome::AwaitingRule)
    }
}
