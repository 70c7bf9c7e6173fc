use sea_orm::DatabaseConnection;

use crate::{LedgerError, ResultLedger};

mod balances;
mod expenses;
mod groups;
mod members;
mod settlements;

pub use expenses::ExpensePage;

/// Run a block inside a DB transaction, committing on success and rolling
/// back (by dropping the transaction) on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self
            .database
            .begin()
            .await
            .map_err(LedgerError::WriteFailed)?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await.map_err(LedgerError::WriteFailed)?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The ledger engine: the authoritative record of who paid what and who
/// owes whom.
///
/// All operations are expressed against the injected database connection;
/// each write commits an expense together with its full split set or
/// nothing at all, and balance reads are pure aggregations over committed
/// history.
#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultLedger<String> {
    use unicode_normalization::UnicodeNormalization;

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.nfc().collect())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
        }
    }
}
