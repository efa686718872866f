//! Property-based tests for aggregation and connection normalization.

use chrono::NaiveDate;
use ledgerbook::connection::normalize;
use ledgerbook::entities::ledger_entry::{EntryType, Model as LedgerEntryModel};
use ledgerbook::services::reports::aggregate;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn entry_type_strategy() -> impl Strategy<Value = Option<EntryType>> {
    prop_oneof![
        Just(Some(EntryType::Revenue)),
        Just(Some(EntryType::Expense)),
        Just(Some(EntryType::Cost)),
        Just(None),
    ]
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    // cents between 0.01 and 10,000,000.00
    (1i64..1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn entries_strategy() -> impl Strategy<Value = Vec<LedgerEntryModel>> {
    prop::collection::vec((amount_strategy(), entry_type_strategy()), 1..60).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (amount, entry_type))| LedgerEntryModel {
                id: i as i32 + 1,
                company_id: 1,
                competence_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                movement_date: None,
                description: format!("entry {i}"),
                account_id: None,
                client_id: None,
                supplier_id: None,
                amount,
                entry_type,
                origin: None,
                document_ref: None,
            })
            .collect()
    })
}

fn host_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,12}(\\.[a-z]{2,6}){0,2}".prop_map(|s| s)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn group_totals_add_up_to_grand_total(entries in entries_strategy()) {
        let statement = aggregate(&entries).expect("non-empty input");
        let by_group: Decimal = statement.lines.iter().map(|l| l.total).sum();
        let by_entry: Decimal = entries.iter().map(|e| e.amount).sum();

        prop_assert_eq!(by_group, statement.grand_total);
        prop_assert_eq!(by_entry, statement.grand_total);
        prop_assert_eq!(statement.entry_count, entries.len());
    }

    #[test]
    fn aggregation_is_pure(entries in entries_strategy()) {
        prop_assert_eq!(aggregate(&entries), aggregate(&entries));
    }

    #[test]
    fn unclassified_group_is_always_last(entries in entries_strategy()) {
        let statement = aggregate(&entries).expect("non-empty input");
        let unclassified = statement
            .lines
            .iter()
            .position(|l| l.entry_type.is_none());
        if let Some(index) = unclassified {
            prop_assert_eq!(index, statement.lines.len() - 1);
        }
    }

    #[test]
    fn ensure_tls_is_idempotent(
        host in host_strategy(),
        port in 1u16..65535,
        mode in prop_oneof![Just(None), Just(Some("disable")), Just(Some("verify-full"))],
    ) {
        let query = mode.map(|m| format!("?sslmode={m}")).unwrap_or_default();
        let raw = format!("postgres://user:pw@{host}:{port}/db{query}");

        let once = normalize(&raw).expect("valid url");
        let twice = normalize(&once).expect("normalized url stays valid");

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.matches("sslmode=").count(), 1);
        if let Some(m) = mode {
            let expected = format!("sslmode={}", m);
            prop_assert!(once.contains(&expected));
        }
    }
}
