//! The shared-expense ledger engine.
//!
//! The ledger turns expense declarations (amount, payer, splitting rule)
//! into per-member obligations, aggregates them into authoritative
//! balances, and proposes/records settlements. Everything around it — the
//! HTTP layer, authentication, the natural-language interpreter — is a
//! collaborator with a narrow contract; in particular, interpreter output
//! is validated data, never authority.

pub use balance::{Balance, aggregate};
pub use candidate::SplitCandidate;
pub use currency::Currency;
pub use error::LedgerError;
pub use expenses::{Expense, ExpenseKind};
pub use groups::Group;
pub use members::Member;
pub use money::Money;
pub use ops::{ExpensePage, Ledger, LedgerBuilder};
pub use plan::{PercentShare, RatioShare, Share, SplitPlan, SplitRule};
pub use settlement::{SettlementPolicy, Transfer, propose_transfers, validate_transfer};
pub use splits::Split;

mod balance;
mod candidate;
mod currency;
mod error;
mod expenses;
mod groups;
mod members;
mod memberships;
mod money;
mod ops;
mod plan;
mod settlement;
mod splits;
mod util;

type ResultLedger<T> = Result<T, LedgerError>;
