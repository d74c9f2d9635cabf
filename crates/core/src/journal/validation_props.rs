//! Property-based tests for journal validation.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use verity_shared::types::{
    AccountId, Amount, Currency, ExchangeRate, JournalId, JournalLineId, Money, OrganizationId,
    PeriodId, UserId,
};

use super::types::{Journal, JournalLine, JournalStatus};
use super::validation::validate_journal;
use crate::error::LedgerError;

/// Strategy for positive amounts at scale 4.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000_000).prop_map(|n| Decimal::new(n, 4))
}

fn line(journal_id: JournalId, number: u32, debit: Decimal, credit: Decimal) -> JournalLine {
    let booked = if debit.is_zero() { credit } else { debit };
    JournalLine {
        id: JournalLineId::new(),
        journal_id,
        account_id: AccountId::new(),
        line_number: number,
        description: format!("line {number}"),
        debit_amount: Money::new(Amount::new(debit).unwrap(), Currency::Eur),
        credit_amount: Money::new(Amount::new(credit).unwrap(), Currency::Eur),
        original_amount: Money::new(Amount::new(booked).unwrap(), Currency::Eur),
        exchange_rate: ExchangeRate::one(),
        tax_code: None,
        tax_amount: None,
        tax_rate: None,
    }
}

/// Builds a journal of `debits.len()` debit lines mirrored by one balancing
/// credit line.
fn balanced_journal(debits: &[Decimal]) -> Journal {
    let id = JournalId::new();
    let now = Utc::now();

    let mut lines: Vec<JournalLine> = debits
        .iter()
        .enumerate()
        .map(|(i, &d)| line(id, u32::try_from(i).unwrap() + 1, d, Decimal::ZERO))
        .collect();
    let total: Decimal = debits.iter().sum();
    let credit_number = u32::try_from(lines.len()).unwrap() + 1;
    lines.push(line(id, credit_number, Decimal::ZERO, total));

    Journal {
        id,
        organization_id: OrganizationId::new(),
        period_id: PeriodId::new(),
        journal_number: "JRN-2024-001".to_string(),
        description: "property journal".to_string(),
        reference: None,
        posting_date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
        status: JournalStatus::Draft,
        currency: Currency::Eur,
        lines,
        hash_prev: None,
        hash_self: None,
        reversal_journal_id: None,
        original_journal_id: None,
        ext_uid: None,
        created_by: UserId::new(),
        posted_by: None,
        posted_at: None,
        created_at: now,
        updated_at: now,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced bookings: any journal whose credit side mirrors the sum of
    /// its debit lines validates, and its totals match exactly at scale 4.
    #[test]
    fn prop_balanced_journal_accepted(debits in prop::collection::vec(amount_strategy(), 1..6)) {
        let journal = balanced_journal(&debits);
        prop_assert!(validate_journal(&journal).is_ok());
        prop_assert_eq!(
            journal.total_debit().unwrap(),
            journal.total_credit().unwrap()
        );
    }

    /// Any one-sided perturbation of a balanced journal is rejected as
    /// unbalanced, down to 0.0001.
    #[test]
    fn prop_perturbed_journal_rejected(
        debits in prop::collection::vec(amount_strategy(), 1..6),
        epsilon in 1i64..1000,
    ) {
        let mut journal = balanced_journal(&debits);
        let last = journal.lines.last_mut().unwrap();
        let perturbed = last.credit_amount.amount.into_inner() + Decimal::new(epsilon, 4);
        last.credit_amount = Money::new(Amount::new(perturbed).unwrap(), Currency::Eur);
        last.original_amount = last.credit_amount;

        prop_assert!(
            matches!(validate_journal(&journal), Err(LedgerError::Unbalanced { .. })),
            "expected Unbalanced error"
        );
    }

    /// Contiguity: removing any line from a multi-line journal (without
    /// renumbering) breaks the 1..N sequence and is rejected.
    #[test]
    fn prop_dropped_line_breaks_contiguity(
        debits in prop::collection::vec(amount_strategy(), 2..6),
        victim in 0usize..4,
    ) {
        let mut journal = balanced_journal(&debits);
        let victim = victim % (journal.lines.len() - 1);
        // Keep the balancing credit line; drop one debit line.
        let removed = journal.lines.remove(victim);
        // Rebalance the credit so only contiguity is at fault.
        let last = journal.lines.last_mut().unwrap();
        let adjusted = last.credit_amount.amount.into_inner()
            - removed.debit_amount.amount.into_inner();
        last.credit_amount = Money::new(Amount::new(adjusted).unwrap(), Currency::Eur);
        last.original_amount = last.credit_amount;

        prop_assert!(
            matches!(
                validate_journal(&journal),
                Err(LedgerError::NonContiguousLineNumbers { .. })
            ),
            "expected NonContiguousLineNumbers error"
        );
    }

    /// Money arithmetic stays at scale 4 under banker's rounding.
    #[test]
    fn prop_totals_render_at_scale_4(debits in prop::collection::vec(amount_strategy(), 1..6)) {
        let journal = balanced_journal(&debits);
        let rendered = journal.total_debit().unwrap().to_string();
        let decimals = rendered
            .split(' ')
            .next()
            .unwrap()
            .split('.')
            .nth(1)
            .unwrap();
        prop_assert_eq!(decimals.len(), 4);
    }
}
