//! Property-based tests for the approval engine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::engine::ApprovalEngine;
use super::fixtures::World;
use super::ledger::HistoryLedger;
use super::model::Expense;
use super::types::{ApprovalDecision, ExpenseStatus, RuleType};
use reimburse_shared::types::UserId;

/// Builds a company with an `n`-step flow and a submitted expense.
fn flow_world(n: usize, amount: Decimal) -> (World, Vec<UserId>, Expense) {
    let mut world = World::new();
    let employee = world.employee();
    let steps: Vec<UserId> = (0..n).map(|_| world.manager()).collect();
    world.add_flow(&steps, Decimal::ZERO, None);
    let mut expense = world.expense(employee, amount);

    let policies = world.policies();
    let engine = ApprovalEngine::new(&policies, &world.directory);
    engine.submit(&expense).unwrap().apply(&mut expense);
    (world, steps, expense)
}

/// Strategy for positive amounts (0.01 to 100,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approving step k never lowers the step counter and never hands the
    /// expense back to an earlier approver.
    #[test]
    fn prop_monotonic_step_advance(n in 1usize..8, amount in positive_amount()) {
        let (world, steps, mut expense) = flow_world(n, amount);
        let policies = world.policies();
        let engine = ApprovalEngine::new(&policies, &world.directory);
        let mut ledger = HistoryLedger::new();

        for (k, approver) in steps.iter().enumerate() {
            prop_assert_eq!(expense.current_approver_id, Some(*approver));
            let before = expense.approval_step;

            engine
                .approve(&expense, &world.actor(*approver), &mut ledger, None)
                .unwrap()
                .apply(&mut expense);

            prop_assert!(expense.approval_step >= before);
            if let Some(current) = expense.current_approver_id {
                prop_assert!(!steps[..=k].contains(&current));
            }
        }
        prop_assert_eq!(expense.status, ExpenseStatus::Approved);
        prop_assert_eq!(ledger.len(), n);
    }

    /// Rejecting at any step ends the expense, whatever remains.
    #[test]
    fn prop_reject_is_final(n in 1usize..8, reject_at in 0usize..8) {
        let reject_at = reject_at % n;
        let (world, steps, mut expense) = flow_world(n, Decimal::ONE_HUNDRED);
        let policies = world.policies();
        let engine = ApprovalEngine::new(&policies, &world.directory);
        let mut ledger = HistoryLedger::new();

        for approver in &steps[..reject_at] {
            engine
                .approve(&expense, &world.actor(*approver), &mut ledger, None)
                .unwrap()
                .apply(&mut expense);
        }
        engine
            .reject(&expense, &world.actor(steps[reject_at]), &mut ledger, None)
            .unwrap()
            .apply(&mut expense);

        prop_assert_eq!(expense.status, ExpenseStatus::Rejected);
        prop_assert_eq!(expense.current_approver_id, None);

        for approver in &steps {
            let result = engine.approve(&expense, &world.actor(*approver), &mut ledger, None);
            prop_assert!(result.is_err());
        }
        prop_assert_eq!(ledger.len(), reject_at + 1);
    }

    /// With N steps and P%, the ceil(P * N / 100)-th approval flips the
    /// expense to approved and the one before leaves it pending.
    #[test]
    fn prop_percentage_rule_threshold(n in 1usize..8, pct in 1i32..=100) {
        let mut world = World::new();
        let employee = world.employee();
        let steps: Vec<UserId> = (0..n).map(|_| world.manager()).collect();
        let flow = world.add_flow(&steps, Decimal::ZERO, None);
        world.add_rule(RuleType::Percentage, Some(pct), None, Some(flow));
        let mut expense = world.expense(employee, Decimal::ONE_HUNDRED);

        let policies = world.policies();
        let engine = ApprovalEngine::new(&policies, &world.directory);
        engine.submit(&expense).unwrap().apply(&mut expense);
        let mut ledger = HistoryLedger::new();

        let pct = usize::try_from(pct).unwrap();
        let required = (pct * n).div_ceil(100);

        for (i, approver) in steps.iter().take(required).enumerate() {
            engine
                .approve(&expense, &world.actor(*approver), &mut ledger, None)
                .unwrap()
                .apply(&mut expense);
            if i + 1 < required {
                prop_assert_eq!(expense.status, ExpenseStatus::Pending);
            }
        }
        prop_assert_eq!(expense.status, ExpenseStatus::Approved);
        prop_assert_eq!(ledger.distinct_approvals(expense.id), required);
    }

    /// History only grows, and earlier entries never change.
    #[test]
    fn prop_history_append_only(
        n in 1usize..6,
        decisions in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let (world, _steps, mut expense) = flow_world(n, Decimal::ONE_HUNDRED);
        let policies = world.policies();
        let engine = ApprovalEngine::new(&policies, &world.directory);
        let mut ledger = HistoryLedger::new();

        for approve in decisions {
            let snapshot: Vec<_> = ledger.entries_for(expense.id).cloned().collect();
            let Some(current) = expense.current_approver_id else { break };
            let decision = if approve { ApprovalDecision::Approved } else { ApprovalDecision::Rejected };

            engine
                .act(&expense, &world.actor(current), decision, &mut ledger, None)
                .unwrap()
                .apply(&mut expense);

            let after: Vec<_> = ledger.entries_for(expense.id).cloned().collect();
            prop_assert_eq!(after.len(), snapshot.len() + 1);
            prop_assert_eq!(&after[..snapshot.len()], &snapshot[..]);
        }
    }
}
