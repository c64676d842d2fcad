use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::CreditConfig,
    domain::{CreditAccount, CreditTransaction, DistributionReport},
    error::{AppError, Result},
    repository::{CreditRepository, UserRepository},
};

pub struct CreditService {
    credit_repo: Arc<dyn CreditRepository>,
    user_repo: Arc<dyn UserRepository>,
    config: CreditConfig,
}

impl CreditService {
    pub fn new(
        credit_repo: Arc<dyn CreditRepository>,
        user_repo: Arc<dyn UserRepository>,
        config: CreditConfig,
    ) -> Self {
        Self { credit_repo, user_repo, config }
    }

    pub async fn consume(&self, user_id: Uuid, amount: i64, description: &str) -> Result<CreditAccount> {
        self.credit_repo.consume(user_id, amount, description).await
    }

    pub async fn grant(&self, user_id: Uuid, amount: i64, description: &str) -> Result<CreditAccount> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.credit_repo.grant(user_id, amount, description).await
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<i64> {
        self.credit_repo.balance(user_id).await
    }

    pub async fn transactions(&self, user_id: Uuid, limit: i64) -> Result<Vec<CreditTransaction>> {
        self.credit_repo.transactions(user_id, limit).await
    }

    /// Grants the periodic allotment to every active user. One user's
    /// failure does not abort the batch; it is logged and counted.
    pub async fn distribute_to_all(&self) -> Result<DistributionReport> {
        let user_ids = self.user_repo.list_active_ids().await?;

        let mut processed_count = 0u64;
        let mut error_count = 0u64;

        for user_id in user_ids {
            match self.credit_repo
                .grant(user_id, self.config.monthly_allotment, "Monthly credit distribution")
                .await
            {
                Ok(_) => processed_count += 1,
                Err(e) => {
                    tracing::warn!("Credit distribution failed for user {}: {}", user_id, e);
                    error_count += 1;
                }
            }
        }

        tracing::info!(
            "Credit distribution complete: {} processed, {} errors",
            processed_count,
            error_count
        );

        Ok(DistributionReport { processed_count, error_count })
    }
}
