//! End-to-end routing scenarios against the in-memory engine.

use reimburse_shared::ManagerFlagLocation;
use reimburse_shared::types::UserId;
use rust_decimal_macros::dec;

use super::engine::{ApprovalEngine, RoutingOutcome};
use super::error::ApprovalError;
use super::fixtures::World;
use super::ledger::HistoryLedger;
use super::model::{Expense, User};
use super::types::{ApprovalDecision, ExpenseStatus, HistoryAction, RuleType, UserRole};

fn submit(world: &World, expense: &mut Expense) -> RoutingOutcome {
    let policies = world.policies();
    let engine = ApprovalEngine::new(&policies, &world.directory);
    let transition = engine.submit(expense).unwrap();
    transition.apply(expense);
    transition.outcome
}

fn act(
    world: &World,
    expense: &mut Expense,
    ledger: &mut HistoryLedger,
    approver: UserId,
    decision: ApprovalDecision,
) -> Result<RoutingOutcome, ApprovalError> {
    let policies = world.policies();
    let engine = ApprovalEngine::new(&policies, &world.directory);
    let transition = engine.act(expense, &world.actor(approver), decision, ledger, None)?;
    transition.apply(expense);
    Ok(transition.outcome)
}

#[test]
fn test_no_policy_no_manager_auto_approves() {
    let mut world = World::new();
    let employee = world.employee();
    let mut expense = world.expense(employee, dec!(50));

    let outcome = submit(&world, &mut expense);

    assert_eq!(outcome, RoutingOutcome::AutoApproved);
    assert_eq!(expense.status, ExpenseStatus::Approved);
    assert_eq!(expense.current_approver_id, None);
    assert_eq!(expense.approval_step, 0);
}

#[test]
fn test_two_step_flow() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    let b = world.manager();
    world.add_flow(&[a, b], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    assert_eq!(expense.current_approver_id, Some(a));
    assert_eq!(expense.approval_step, 1);
    assert_eq!(expense.status, ExpenseStatus::Pending);

    let outcome = act(&world, &mut expense, &mut ledger, a, ApprovalDecision::Approved).unwrap();
    assert_eq!(
        outcome,
        RoutingOutcome::Advanced {
            approver_id: b,
            step: 2
        }
    );
    assert_eq!(expense.current_approver_id, Some(b));
    assert_eq!(expense.approval_step, 2);

    let outcome = act(&world, &mut expense, &mut ledger, b, ApprovalDecision::Approved).unwrap();
    assert_eq!(outcome, RoutingOutcome::Approved);
    assert_eq!(expense.status, ExpenseStatus::Approved);
    assert_eq!(expense.current_approver_id, None);

    let history: Vec<_> = ledger.entries_for(expense.id).collect();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.action == HistoryAction::Approved));
    assert_eq!(history[0].step, 1);
    assert_eq!(history[1].step, 2);
}

#[test]
fn test_specific_approver_rule_wins_over_flow() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    let x = world.manager();
    world.add_flow(&[a, x], dec!(0), None);
    world.add_rule(RuleType::SpecificApprover, None, Some(x), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    assert_eq!(expense.current_approver_id, Some(a));

    // A is not X: still pending, handed along the sequence.
    act(&world, &mut expense, &mut ledger, a, ApprovalDecision::Approved).unwrap();
    assert_eq!(expense.status, ExpenseStatus::Pending);
    assert_eq!(expense.current_approver_id, Some(x));

    act(&world, &mut expense, &mut ledger, x, ApprovalDecision::Approved).unwrap();
    assert_eq!(expense.status, ExpenseStatus::Approved);
    assert_eq!(expense.current_approver_id, None);
}

#[test]
fn test_specific_approver_reached_after_sequence_ends() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    let x = world.manager();
    world.add_flow(&[a], dec!(0), None);
    world.add_rule(RuleType::SpecificApprover, None, Some(x), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    let outcome = act(&world, &mut expense, &mut ledger, a, ApprovalDecision::Approved).unwrap();

    assert_eq!(
        outcome,
        RoutingOutcome::HandedToSpecificApprover { approver_id: x }
    );
    assert_eq!(expense.current_approver_id, Some(x));
    assert_eq!(expense.approval_step, 1);

    act(&world, &mut expense, &mut ledger, x, ApprovalDecision::Approved).unwrap();
    assert_eq!(expense.status, ExpenseStatus::Approved);
}

#[test]
fn test_admin_override_mid_flow() {
    let mut world = World::new();
    let employee = world.employee();
    let steps = [world.manager(), world.manager(), world.manager()];
    let admin = world.admin();
    world.add_flow(&steps, dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    assert_eq!(expense.approval_step, 1);

    let policies = world.policies();
    let engine = ApprovalEngine::new(&policies, &world.directory);
    let transition = engine
        .override_decision(
            &expense,
            &world.actor(admin),
            ApprovalDecision::Rejected,
            &mut ledger,
            Some("duplicate claim"),
        )
        .unwrap();
    transition.apply(&mut expense);

    assert_eq!(expense.status, ExpenseStatus::Rejected);
    assert_eq!(expense.current_approver_id, None);
    let history: Vec<_> = ledger.entries_for(expense.id).collect();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].approver_id, admin);
    assert_eq!(history[0].action, HistoryAction::Rejected);
    assert_eq!(
        history[0].comments.as_deref(),
        Some("Admin override: duplicate claim")
    );
}

#[test]
fn test_override_requires_admin_and_pending() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    let admin = world.admin();
    world.add_flow(&[a], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();
    submit(&world, &mut expense);

    let policies = world.policies();
    let engine = ApprovalEngine::new(&policies, &world.directory);

    let err = engine
        .override_decision(&expense, &world.actor(a), ApprovalDecision::Approved, &mut ledger, None)
        .unwrap_err();
    assert!(matches!(err, ApprovalError::Forbidden(_)));

    expense.status = ExpenseStatus::Approved;
    let err = engine
        .override_decision(&expense, &world.actor(admin), ApprovalDecision::Rejected, &mut ledger, None)
        .unwrap_err();
    assert_eq!(err, ApprovalError::InvalidApprovalTarget);
    assert!(ledger.is_empty());
}

#[test]
fn test_reject_is_final() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    let b = world.manager();
    world.add_flow(&[a, b], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    let outcome = act(&world, &mut expense, &mut ledger, a, ApprovalDecision::Rejected).unwrap();

    assert_eq!(outcome, RoutingOutcome::Rejected);
    assert_eq!(expense.status, ExpenseStatus::Rejected);
    assert_eq!(expense.current_approver_id, None);
    assert_eq!(ledger.len(), 1);

    let err = act(&world, &mut expense, &mut ledger, b, ApprovalDecision::Approved).unwrap_err();
    assert_eq!(err, ApprovalError::InvalidApprovalTarget);
}

#[test]
fn test_terminal_expense_rejects_former_approver() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    world.add_flow(&[a], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    act(&world, &mut expense, &mut ledger, a, ApprovalDecision::Approved).unwrap();
    assert_eq!(expense.status, ExpenseStatus::Approved);

    for decision in [ApprovalDecision::Approved, ApprovalDecision::Rejected] {
        let err = act(&world, &mut expense, &mut ledger, a, decision).unwrap_err();
        assert_eq!(err, ApprovalError::InvalidApprovalTarget);
    }
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_wrong_approver_gets_vague_error() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    let stranger = world.manager();
    world.add_flow(&[a], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    let err = act(&world, &mut expense, &mut ledger, stranger, ApprovalDecision::Approved)
        .unwrap_err();

    assert_eq!(err.to_string(), "Expense not found or not awaiting your approval");
    assert!(ledger.is_empty());
    assert_eq!(expense.current_approver_id, Some(a));
}

#[test]
fn test_percentage_rule_over_three_step_flow() {
    let mut world = World::new();
    let employee = world.employee();
    let steps = [world.manager(), world.manager(), world.manager()];
    let flow = world.add_flow(&steps, dec!(0), None);
    world.add_rule(RuleType::Percentage, Some(60), None, Some(flow));
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);

    // ceil(0.6 * 3) = 2 approvals needed.
    act(&world, &mut expense, &mut ledger, steps[0], ApprovalDecision::Approved).unwrap();
    assert_eq!(expense.status, ExpenseStatus::Pending);
    assert_eq!(expense.current_approver_id, Some(steps[1]));

    act(&world, &mut expense, &mut ledger, steps[1], ApprovalDecision::Approved).unwrap();
    assert_eq!(expense.status, ExpenseStatus::Approved);
    assert_eq!(expense.approval_step, 2);
}

#[test]
fn test_hybrid_rule_specific_approver_short_circuits() {
    let mut world = World::new();
    let employee = world.employee();
    let x = world.manager();
    let steps = [x, world.manager(), world.manager()];
    world.add_flow(&steps, dec!(0), None);
    world.add_rule(RuleType::Hybrid, Some(100), Some(x), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    act(&world, &mut expense, &mut ledger, x, ApprovalDecision::Approved).unwrap();

    assert_eq!(expense.status, ExpenseStatus::Approved);
}

#[test]
fn test_percentage_rule_without_flow_counts_one_approver() {
    let mut world = World::new();
    let manager = world.manager();
    let employee = world.add_user(UserRole::Employee, Some(manager), false);
    world.add_rule(RuleType::Percentage, Some(100), None, None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    assert_eq!(expense.current_approver_id, Some(manager));
    assert_eq!(expense.approval_step, 0);

    act(&world, &mut expense, &mut ledger, manager, ApprovalDecision::Approved).unwrap();
    assert_eq!(expense.status, ExpenseStatus::Approved);
}

#[test]
fn test_percentage_rule_ignores_band_flow_length() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    let b = world.manager();
    world.add_flow(&[a, b], dec!(0), None);
    world.add_rule(RuleType::Percentage, Some(100), None, None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    assert_eq!(expense.current_approver_id, Some(a));

    // One approval out of an implicit single approver meets 100%.
    act(&world, &mut expense, &mut ledger, a, ApprovalDecision::Approved).unwrap();
    assert_eq!(expense.status, ExpenseStatus::Approved);
    assert_eq!(expense.current_approver_id, None);
}

#[test]
fn test_manager_fallback_reads_manager_flag() {
    let mut world = World::new();
    let willing = world.add_user(UserRole::Manager, None, true);
    let unwilling = world.add_user(UserRole::Manager, None, false);
    let routed = world.add_user(UserRole::Employee, Some(willing), false);
    let skipped = world.add_user(UserRole::Employee, Some(unwilling), false);

    let mut expense = world.expense(routed, dec!(20));
    let outcome = submit(&world, &mut expense);
    assert_eq!(outcome, RoutingOutcome::AssignedApprover { approver_id: willing });
    assert_eq!(expense.approval_step, 0);
    assert_eq!(expense.status, ExpenseStatus::Pending);

    let mut expense = world.expense(skipped, dec!(20));
    assert_eq!(submit(&world, &mut expense), RoutingOutcome::AutoApproved);
}

#[test]
fn test_manager_fallback_reads_employee_flag_when_configured() {
    let mut world = World::new();
    let manager = world.add_user(UserRole::Manager, None, false);
    let employee = world.add_user(UserRole::Employee, Some(manager), true);
    let mut expense = world.expense(employee, dec!(20));

    let policies = world.policies();
    let engine = ApprovalEngine::new(&policies, &world.directory)
        .with_manager_flag(ManagerFlagLocation::Employee);
    let transition = engine.submit(&expense).unwrap();
    transition.apply(&mut expense);

    assert_eq!(expense.current_approver_id, Some(manager));

    let default_engine = ApprovalEngine::new(&policies, &world.directory);
    let fresh = world.expense(employee, dec!(20));
    assert_eq!(
        default_engine.submit(&fresh).unwrap().outcome,
        RoutingOutcome::AutoApproved
    );
}

#[test]
fn test_stale_first_approver_auto_approves() {
    let mut world = World::new();
    let employee = world.employee();
    let ghost = UserId::new();
    world.add_flow(&[ghost], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));

    let outcome = submit(&world, &mut expense);

    assert_eq!(outcome, RoutingOutcome::StaleApprover { approver_id: ghost });
    assert_eq!(expense.status, ExpenseStatus::Approved);
    assert_eq!(expense.current_approver_id, None);
    assert_eq!(expense.approval_step, 0);
}

#[test]
fn test_stale_next_approver_auto_approves_with_history() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    let ghost = UserId::new();
    world.add_flow(&[a, ghost], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    let outcome = act(&world, &mut expense, &mut ledger, a, ApprovalDecision::Approved).unwrap();

    assert_eq!(outcome, RoutingOutcome::StaleApprover { approver_id: ghost });
    assert_eq!(expense.status, ExpenseStatus::Approved);
    assert_eq!(expense.approval_step, 1);
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_inactive_approver_is_treated_as_stale() {
    let mut world = World::new();
    let employee = world.employee();
    let departed = world.manager();
    world.add_flow(&[departed], dec!(0), None);
    if let Some(user) = world.directory.get(departed).cloned() {
        world.directory.insert(User {
            is_active: false,
            ..user
        });
    }
    let mut expense = world.expense(employee, dec!(100));

    let outcome = submit(&world, &mut expense);

    assert_eq!(outcome, RoutingOutcome::StaleApprover { approver_id: departed });
    assert_eq!(expense.status, ExpenseStatus::Approved);
    assert_eq!(expense.current_approver_id, None);
}

#[test]
fn test_demoted_approver_is_treated_as_stale() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    let demoted = world.add_user(UserRole::Employee, None, false);
    world.add_flow(&[a, demoted], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    let outcome = act(&world, &mut expense, &mut ledger, a, ApprovalDecision::Approved).unwrap();

    assert_eq!(outcome, RoutingOutcome::StaleApprover { approver_id: demoted });
    assert_eq!(expense.status, ExpenseStatus::Approved);
}

#[test]
fn test_missing_employee_is_fatal() {
    let world = World::new();
    let expense = world.expense(UserId::new(), dec!(10));
    let policies = world.policies();
    let engine = ApprovalEngine::new(&policies, &world.directory);

    let err = engine.submit(&expense).unwrap_err();
    assert!(matches!(err, ApprovalError::ReferenceIntegrity(_)));
}

#[test]
fn test_resubmitting_routed_expense_fails() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    world.add_flow(&[a], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    submit(&world, &mut expense);

    let policies = world.policies();
    let engine = ApprovalEngine::new(&policies, &world.directory);
    assert!(matches!(
        engine.submit(&expense),
        Err(ApprovalError::Validation(_))
    ));
}

#[test]
fn test_flow_amount_band_selects_route() {
    let mut world = World::new();
    let employee = world.employee();
    let small = world.manager();
    let big = world.manager();
    world.add_flow(&[small], dec!(0), Some(dec!(999.99)));
    world.add_flow(&[big], dec!(1000), None);

    let mut cheap = world.expense(employee, dec!(10));
    submit(&world, &mut cheap);
    assert_eq!(cheap.current_approver_id, Some(small));

    let mut pricey = world.expense(employee, dec!(5000));
    submit(&world, &mut pricey);
    assert_eq!(pricey.current_approver_id, Some(big));
}

#[test]
fn test_version_bumps_on_every_transition() {
    let mut world = World::new();
    let employee = world.employee();
    let a = world.manager();
    world.add_flow(&[a], dec!(0), None);
    let mut expense = world.expense(employee, dec!(100));
    let mut ledger = HistoryLedger::new();

    submit(&world, &mut expense);
    assert_eq!(expense.version, 1);
    act(&world, &mut expense, &mut ledger, a, ApprovalDecision::Approved).unwrap();
    assert_eq!(expense.version, 2);
}
