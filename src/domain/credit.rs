use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Derived balance for one user. Mutated only through the ledger, which
/// writes this row and an audit transaction row inside one database
/// transaction.
#[derive(Debug, Clone, Serialize)]
pub struct CreditAccount {
    pub user_id: Uuid,
    pub balance: i64,
}

/// Append-only audit row. `amount` is signed: grants positive,
/// consumption negative.
#[derive(Debug, Clone, Serialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a distribute-to-all batch run.
#[derive(Debug, Clone, Serialize)]
pub struct DistributionReport {
    pub processed_count: u64,
    pub error_count: u64,
}
