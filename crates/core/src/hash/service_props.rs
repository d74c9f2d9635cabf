//! Property-based tests for the hash chain.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use verity_shared::types::{
    AccountId, Amount, Currency, ExchangeRate, JournalHash, JournalId, JournalLineId, Money,
    OrganizationId, PeriodId, UserId,
};

use super::service::HashService;
use crate::journal::types::{Journal, JournalLine, JournalStatus};

fn eur(value: Decimal) -> Money {
    Money::new(Amount::new(value).unwrap(), Currency::Eur)
}

fn sealed_journal(org: OrganizationId, index: usize, amount: Decimal, prev: Option<JournalHash>) -> Journal {
    let id = JournalId::new();
    let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
    let mk_line = |line_number: u32, debit: Decimal, credit: Decimal| JournalLine {
        id: JournalLineId::new(),
        journal_id: id,
        account_id: AccountId::new(),
        line_number,
        description: format!("line {line_number}"),
        debit_amount: eur(debit),
        credit_amount: eur(credit),
        original_amount: eur(if debit.is_zero() { credit } else { debit }),
        exchange_rate: ExchangeRate::one(),
        tax_code: None,
        tax_amount: None,
        tax_rate: None,
    };

    let mut journal = Journal {
        id,
        organization_id: org,
        period_id: PeriodId::new(),
        journal_number: format!("JRN-2024-{:03}", index + 1),
        description: format!("entry {}", index + 1),
        reference: None,
        posting_date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
        status: JournalStatus::Posted,
        currency: Currency::Eur,
        lines: vec![
            mk_line(1, amount, Decimal::ZERO),
            mk_line(2, Decimal::ZERO, amount),
        ],
        hash_prev: prev,
        hash_self: None,
        reversal_journal_id: None,
        original_journal_id: None,
        ext_uid: None,
        created_by: UserId::new(),
        posted_by: Some(UserId::new()),
        posted_at: Some(now),
        created_at: now,
        updated_at: now,
    };
    journal.hash_self = Some(HashService::compute(&journal, prev.as_ref()));
    journal
}

fn chain(amounts: &[Decimal]) -> Vec<Journal> {
    let org = OrganizationId::new();
    let mut prev = None;
    amounts
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            let journal = sealed_journal(org, i, amount, prev);
            prev = journal.hash_self;
            journal
        })
        .collect()
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000_000).prop_map(|n| Decimal::new(n, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Chain integrity: any honestly built chain verifies end to end.
    #[test]
    fn prop_honest_chain_verifies(amounts in prop::collection::vec(amount_strategy(), 1..8)) {
        let journals = chain(&amounts);
        let result = HashService::verify_chain(&journals);
        prop_assert!(result.is_valid);
        prop_assert_eq!(result.total_journals, journals.len() as u64);
    }

    /// Tampering detection: changing any hashed field of any node after
    /// sealing makes that node fail verification. No false negatives.
    #[test]
    fn prop_tampering_any_node_is_detected(
        amounts in prop::collection::vec(amount_strategy(), 1..8),
        victim in any::<prop::sample::Index>(),
        field in 0u8..5,
    ) {
        let mut journals = chain(&amounts);
        let victim = victim.index(journals.len());
        let target = &mut journals[victim];
        match field {
            0 => target.description.push('!'),
            1 => target.journal_number.push('X'),
            2 => target.reference = Some("slipped-in".to_string()),
            3 => {
                let bumped = target.lines[0].debit_amount.amount.into_inner()
                    + Decimal::new(1, 4);
                target.lines[0].debit_amount = eur(bumped);
            }
            _ => target.lines[1].description.push('!'),
        }
        let tampered_id = target.id;

        prop_assert!(!HashService::verify_journal(&journals[victim]));

        let result = HashService::verify_chain(&journals);
        prop_assert!(!result.is_valid);
        prop_assert!(result.invalid_journals.contains(&tampered_id));
    }

    /// Idempotence: repeated verification without intervening mutation
    /// returns identical results.
    #[test]
    fn prop_verification_is_pure(amounts in prop::collection::vec(amount_strategy(), 0..8)) {
        let journals = chain(&amounts);
        let first = HashService::verify_chain(&journals);
        let second = HashService::verify_chain(&journals);
        prop_assert_eq!(first, second);
    }
}
