use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreditAccount, CreditTransaction},
    error::{AppError, Result},
    repository::CreditRepository,
};

#[derive(FromRow)]
struct TransactionRow {
    id: String,
    user_id: String,
    amount: i64,
    description: String,
    created_at: NaiveDateTime,
}

pub struct SqliteCreditRepository {
    pool: SqlitePool,
}

impl SqliteCreditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_transaction(row: TransactionRow) -> Result<CreditTransaction> {
        Ok(CreditTransaction {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            amount: row.amount,
            description: row.description,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl CreditRepository for SqliteCreditRepository {
    async fn consume(&self, user_id: Uuid, amount: i64, description: &str) -> Result<CreditAccount> {
        if amount <= 0 {
            return Err(AppError::Validation("Amount must be positive".to_string()));
        }

        let user_id_str = user_id.to_string();
        let mut tx = self.pool.begin().await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Conditional decrement judged by rows-affected: underflow safety
        // holds under any isolation level, and the audit row below commits
        // or rolls back together with it.
        let result = sqlx::query(
            "UPDATE credit_accounts SET balance = balance - ? WHERE user_id = ? AND balance >= ?"
        )
        .bind(amount)
        .bind(&user_id_str)
        .bind(amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| AppError::Database(e.to_string()))?;

            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM credit_accounts WHERE user_id = ?"
            )
            .bind(&user_id_str)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

            if exists == 0 {
                return Err(AppError::NotFound("Credit account not found".to_string()));
            }
            return Err(AppError::InsufficientCredits(
                "Not enough credits for this action".to_string(),
            ));
        }

        let tx_id = Uuid::new_v4().to_string();
        let now_naive = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO credit_transactions (id, user_id, amount, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#
        )
        .bind(&tx_id)
        .bind(&user_id_str)
        .bind(-amount)
        .bind(description)
        .bind(now_naive)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let balance = sqlx::query_scalar::<_, i64>(
            "SELECT balance FROM credit_accounts WHERE user_id = ?"
        )
        .bind(&user_id_str)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        Ok(CreditAccount { user_id, balance })
    }

    async fn grant(&self, user_id: Uuid, amount: i64, description: &str) -> Result<CreditAccount> {
        if amount <= 0 {
            return Err(AppError::Validation("Amount must be positive".to_string()));
        }

        let user_id_str = user_id.to_string();
        let mut tx = self.pool.begin().await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO credit_accounts (user_id, balance)
            VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET balance = balance + excluded.balance
            "#
        )
        .bind(&user_id_str)
        .bind(amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let tx_id = Uuid::new_v4().to_string();
        let now_naive = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO credit_transactions (id, user_id, amount, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#
        )
        .bind(&tx_id)
        .bind(&user_id_str)
        .bind(amount)
        .bind(description)
        .bind(now_naive)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let balance = sqlx::query_scalar::<_, i64>(
            "SELECT balance FROM credit_accounts WHERE user_id = ?"
        )
        .bind(&user_id_str)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;

        Ok(CreditAccount { user_id, balance })
    }

    async fn balance(&self, user_id: Uuid) -> Result<i64> {
        let user_id_str = user_id.to_string();

        let balance = sqlx::query_scalar::<_, i64>(
            "SELECT balance FROM credit_accounts WHERE user_id = ?"
        )
        .bind(&user_id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(balance.unwrap_or(0))
    }

    async fn transactions(&self, user_id: Uuid, limit: i64) -> Result<Vec<CreditTransaction>> {
        let user_id_str = user_id.to_string();

        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, amount, description, created_at
            FROM credit_transactions
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#
        )
        .bind(&user_id_str)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_transaction)
            .collect()
    }
}
