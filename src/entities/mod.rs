//! Relational model of the bookkeeping domain.
//!
//! `company` is the root; every other table references it. Only `company`
//! and `ledger_entry` have write paths today, the rest are scaffolding with
//! their foreign keys declared.

pub mod chart_of_accounts;
pub mod client;
pub mod company;
pub mod inventory_position;
pub mod ledger_entry;
pub mod payable;
pub mod product;
pub mod receivable;
pub mod supplier;

pub use company::{Entity as Company, Model as CompanyModel};
pub use ledger_entry::{Entity as LedgerEntry, EntryType, Model as LedgerEntryModel};
