mod common;

use std::sync::Arc;

use atrium::{
    config::CreditConfig,
    domain::{UpdateUserRequest, UserRole, UserStatus},
    error::AppError,
    repository::{CreditRepository, SqliteCreditRepository, SqliteUserRepository, UserRepository},
    service::CreditService,
};
use common::{create_user, test_pool};
use sqlx::SqlitePool;
use uuid::Uuid;

async fn signed_sum(pool: &SqlitePool, user_id: Uuid) -> anyhow::Result<i64> {
    let sum = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(amount), 0) FROM credit_transactions WHERE user_id = ?"
    )
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(sum)
}

async fn transaction_count(pool: &SqlitePool, user_id: Uuid) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM credit_transactions WHERE user_id = ?"
    )
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

#[tokio::test]
async fn test_balance_equals_signed_sum_after_mixed_operations() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let user = create_user(&pool, "spender", UserRole::Member).await?;
    let repo = SqliteCreditRepository::new(pool.clone());

    repo.grant(user.id, 100, "Registration credits").await?;
    repo.consume(user.id, 30, "Brochure download").await?;
    repo.grant(user.id, 25, "Monthly credit distribution").await?;
    repo.consume(user.id, 40, "Lead export").await?;

    let balance = repo.balance(user.id).await?;
    assert_eq!(balance, 55);
    assert_eq!(balance, signed_sum(&pool, user.id).await?);
    assert_eq!(transaction_count(&pool, user.id).await?, 4);

    Ok(())
}

#[tokio::test]
async fn test_consume_underflow_fails_and_writes_nothing() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let user = create_user(&pool, "spender", UserRole::Member).await?;
    let repo = SqliteCreditRepository::new(pool.clone());

    repo.grant(user.id, 20, "Registration credits").await?;

    let result = repo.consume(user.id, 50, "Too expensive").await;
    assert!(matches!(result, Err(AppError::InsufficientCredits(_))));

    // The failed consume must leave no trace: unchanged balance, no audit row.
    assert_eq!(repo.balance(user.id).await?, 20);
    assert_eq!(signed_sum(&pool, user.id).await?, 20);
    assert_eq!(transaction_count(&pool, user.id).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_consume_without_account_is_not_found() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let user = create_user(&pool, "newcomer", UserRole::Member).await?;
    let repo = SqliteCreditRepository::new(pool.clone());

    let result = repo.consume(user.id, 10, "No account yet").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(transaction_count(&pool, user.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_consume_exact_balance_reaches_zero() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let user = create_user(&pool, "spender", UserRole::Member).await?;
    let repo = SqliteCreditRepository::new(pool.clone());

    repo.grant(user.id, 15, "Registration credits").await?;
    let account = repo.consume(user.id, 15, "Spend it all").await?;

    assert_eq!(account.balance, 0);
    assert_eq!(signed_sum(&pool, user.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_grant_is_repeatable_by_design() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let user = create_user(&pool, "lucky", UserRole::Member).await?;
    let repo = SqliteCreditRepository::new(pool.clone());

    // Granting twice for the same reason stacks; dedup is the caller's job.
    repo.grant(user.id, 10, "Monthly credit distribution").await?;
    let account = repo.grant(user.id, 10, "Monthly credit distribution").await?;

    assert_eq!(account.balance, 20);
    assert_eq!(transaction_count(&pool, user.id).await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_rejects_non_positive_amounts() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let user = create_user(&pool, "spender", UserRole::Member).await?;
    let repo = SqliteCreditRepository::new(pool.clone());

    assert!(matches!(repo.grant(user.id, 0, "Nothing").await, Err(AppError::Validation(_))));
    assert!(matches!(repo.consume(user.id, -5, "Negative").await, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_distribute_to_all_grants_every_active_user() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let user1 = create_user(&pool, "user1", UserRole::Member).await?;
    let user2 = create_user(&pool, "user2", UserRole::Member).await?;
    let user3 = create_user(&pool, "user3", UserRole::Member).await?;

    let credit_repo = Arc::new(SqliteCreditRepository::new(pool.clone()));
    let user_repo = Arc::new(SqliteUserRepository::new(pool.clone()));

    // Disabled users sit out the batch.
    user_repo.update(user3.id, UpdateUserRequest {
        status: Some(UserStatus::Disabled),
        ..Default::default()
    }).await?;

    let service = CreditService::new(
        credit_repo.clone(),
        user_repo,
        CreditConfig { monthly_allotment: 100, registration_grant: 0 },
    );

    let report = service.distribute_to_all().await?;
    assert_eq!(report.processed_count, 2);
    assert_eq!(report.error_count, 0);

    for id in [user1.id, user2.id] {
        assert_eq!(credit_repo.balance(id).await?, 100);
        assert_eq!(signed_sum(&pool, id).await?, 100);
    }
    assert_eq!(credit_repo.balance(user3.id).await?, 0);

    Ok(())
}
