//! The frozen canonical byte format hashed for each journal.
//!
//! This rendering must stay byte-identical across implementations and
//! platforms: lines sorted by line number, decimals at fixed scale (4 for
//! amounts, 6 for rates), dates as ISO-8601, absent optionals as the empty
//! string. Any change to this format is a new chain version.

use rust_decimal::{Decimal, RoundingStrategy};

use verity_shared::types::JournalHash;

use crate::journal::types::{Journal, JournalLine};

/// Renders a decimal at exactly `scale` fractional digits.
fn render_scaled(value: Decimal, scale: u32) -> String {
    let mut scaled =
        value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    scaled.rescale(scale);
    scaled.to_string()
}

/// Renders one line record: `|`-joined fields in frozen order.
fn serialize_line(line: &JournalLine) -> String {
    let zero = render_scaled(Decimal::ZERO, 4);
    let (original_debit, original_credit) = if line.is_debit() {
        (
            render_scaled(line.original_amount.amount.into_inner(), 4),
            zero.clone(),
        )
    } else {
        (
            zero.clone(),
            render_scaled(line.original_amount.amount.into_inner(), 4),
        )
    };

    [
        line.account_id.to_string(),
        line.line_number.to_string(),
        line.description.clone(),
        render_scaled(line.debit_amount.amount.into_inner(), 4),
        render_scaled(line.credit_amount.amount.into_inner(), 4),
        line.original_amount.currency.to_string(),
        original_debit,
        original_credit,
        render_scaled(line.exchange_rate.into_inner(), 6),
        line.tax_code.clone().unwrap_or_default(),
        line.tax_amount
            .map_or_else(|| zero.clone(), |amount| render_scaled(amount.into_inner(), 4)),
        line.tax_rate
            .map_or(zero, |rate| render_scaled(rate, 4)),
    ]
    .join("|")
}

/// Renders the canonical byte sequence for `journal` chained onto
/// `hash_prev`.
///
/// The totals are sums over the stored line amounts; no validation happens
/// here. Serialization is a pure rendering of the sealed field set so that
/// verification of tampered data never fails to produce bytes to compare.
#[must_use]
pub fn serialize_journal(journal: &Journal, hash_prev: Option<&JournalHash>) -> Vec<u8> {
    let total_debit: Decimal = journal
        .lines
        .iter()
        .map(|line| line.debit_amount.amount.into_inner())
        .sum();
    let total_credit: Decimal = journal
        .lines
        .iter()
        .map(|line| line.credit_amount.amount.into_inner())
        .sum();

    let mut lines: Vec<&JournalLine> = journal.lines.iter().collect();
    lines.sort_by_key(|line| line.line_number);
    let lines_serialization = lines
        .iter()
        .map(|line| serialize_line(line))
        .collect::<Vec<_>>()
        .join(";");

    let header = [
        journal.organization_id.to_string(),
        journal.period_id.to_string(),
        journal.journal_number.clone(),
        journal.description.clone(),
        journal.reference.clone().unwrap_or_default(),
        journal.posting_date.to_string(),
        render_scaled(total_debit, 4),
        render_scaled(total_credit, 4),
        journal.currency.to_string(),
        hash_prev.map(JournalHash::to_hex).unwrap_or_default(),
        lines_serialization,
    ];

    header.join(":").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use verity_shared::types::{
        AccountId, Amount, Currency, ExchangeRate, JournalId, JournalLineId, Money,
        OrganizationId, PeriodId, UserId,
    };

    use crate::journal::types::JournalStatus;

    fn eur(value: Decimal) -> Money {
        Money::new(Amount::new(value).unwrap(), Currency::Eur)
    }

    fn fixture() -> Journal {
        let id = JournalId::new();
        let now = Utc::now();
        let debit = JournalLine {
            id: JournalLineId::new(),
            journal_id: id,
            account_id: AccountId::new(),
            line_number: 1,
            description: "cash".to_string(),
            debit_amount: eur(dec!(1500)),
            credit_amount: eur(dec!(0)),
            original_amount: eur(dec!(1500)),
            exchange_rate: ExchangeRate::one(),
            tax_code: None,
            tax_amount: None,
            tax_rate: None,
        };
        let credit = JournalLine {
            id: JournalLineId::new(),
            journal_id: id,
            account_id: AccountId::new(),
            line_number: 2,
            description: "revenue".to_string(),
            debit_amount: eur(dec!(0)),
            credit_amount: eur(dec!(1500)),
            original_amount: eur(dec!(1500)),
            exchange_rate: ExchangeRate::one(),
            tax_code: None,
            tax_amount: None,
            tax_rate: None,
        };

        Journal {
            id,
            organization_id: OrganizationId::new(),
            period_id: PeriodId::new(),
            journal_number: "JRN-2024-001".to_string(),
            description: "May sales".to_string(),
            reference: None,
            posting_date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
            status: JournalStatus::Draft,
            currency: Currency::Eur,
            lines: vec![debit, credit],
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

    #[test]
    fn test_header_field_order_and_rendering() {
        let journal = fixture();
        let serialized = String::from_utf8(serialize_journal(&journal, None)).unwrap();
        let expected_prefix = format!(
            "{}:{}:JRN-2024-001:May sales::2024-05-15:1500.0000:1500.0000:EUR::",
            journal.organization_id, journal.period_id
        );
        assert!(
            serialized.starts_with(&expected_prefix),
            "got {serialized}"
        );
    }

    #[test]
    fn test_line_record_rendering() {
        let journal = fixture();
        let serialized = String::from_utf8(serialize_journal(&journal, None)).unwrap();
        let lines_part = serialized.rsplit("::").next().unwrap();
        let records: Vec<&str> = lines_part.split(';').collect();
        assert_eq!(records.len(), 2);

        let debit_fields: Vec<&str> = records[0].split('|').collect();
        assert_eq!(debit_fields.len(), 12);
        assert_eq!(debit_fields[1], "1");
        assert_eq!(debit_fields[2], "cash");
        assert_eq!(debit_fields[3], "1500.0000");
        assert_eq!(debit_fields[4], "0.0000");
        assert_eq!(debit_fields[5], "EUR");
        // Debit line: original amount on the debit slot.
        assert_eq!(debit_fields[6], "1500.0000");
        assert_eq!(debit_fields[7], "0.0000");
        assert_eq!(debit_fields[8], "1.000000");
        assert_eq!(debit_fields[9], "");
        assert_eq!(debit_fields[10], "0.0000");
        assert_eq!(debit_fields[11], "0.0000");

        let credit_fields: Vec<&str> = records[1].split('|').collect();
        // Credit line: original amount on the credit slot.
        assert_eq!(credit_fields[6], "0.0000");
        assert_eq!(credit_fields[7], "1500.0000");
    }

    #[test]
    fn test_in_memory_line_order_is_irrelevant() {
        let journal = fixture();
        let before = serialize_journal(&journal, None);

        let mut shuffled = journal;
        shuffled.lines.swap(0, 1);
        let after = serialize_journal(&shuffled, None);

        assert_eq!(before, after);
    }

    #[test]
    fn test_hash_prev_is_embedded() {
        let journal = fixture();
        let prev = JournalHash::compute(b"predecessor");
        let with_prev = serialize_journal(&journal, Some(&prev));
        let without_prev = serialize_journal(&journal, None);
        assert_ne!(with_prev, without_prev);
        assert!(String::from_utf8(with_prev)
            .unwrap()
            .contains(&prev.to_hex()));
    }

    #[test]
    fn test_reference_and_tax_fields_render() {
        let mut journal = fixture();
        journal.reference = Some("INV-77".to_string());
        journal.lines[0].tax_code = Some("VAT19".to_string());
        journal.lines[0].tax_amount = Some(Amount::new(dec!(239.4958)).unwrap());
        journal.lines[0].tax_rate = Some(dec!(0.19));

        let serialized = String::from_utf8(serialize_journal(&journal, None)).unwrap();
        assert!(serialized.contains(":INV-77:"));
        assert!(serialized.contains("|VAT19|239.4958|0.1900"));
    }

    #[test]
    fn test_trailing_zeros_always_present() {
        let mut journal = fixture();
        journal.lines[0].debit_amount = eur(dec!(1500.5));
        journal.lines[1].credit_amount = eur(dec!(1500.5));
        journal.lines[0].original_amount = eur(dec!(1500.5));
        journal.lines[1].original_amount = eur(dec!(1500.5));

        let serialized = String::from_utf8(serialize_journal(&journal, None)).unwrap();
        assert!(serialized.contains("1500.5000"));
        assert!(!serialized.contains("|1500.5|"));
    }
}
