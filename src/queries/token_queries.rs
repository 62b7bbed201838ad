use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    error::Result,
    models::{TokenKind, UserToken},
};

pub async fn create_token(
    pool: &PgPool,
    kind: TokenKind,
    user_id: i32,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<UserToken> {
    let query = format!(
        "INSERT INTO {} (user_id, token_hash, expires_at)
         VALUES ($1, $2, $3)
         RETURNING *",
        kind.table()
    );

    let token = sqlx::query_as::<_, UserToken>(&query)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

    Ok(token)
}

/// Locks the token row for the rest of the transaction so it is redeemed at most once.
pub async fn find_by_hash_for_update(
    tx: &mut Transaction<'_, Postgres>,
    kind: TokenKind,
    token_hash: &str,
) -> Result<Option<UserToken>> {
    let query = format!(
        "SELECT * FROM {} WHERE token_hash = $1 FOR UPDATE",
        kind.table()
    );

    let token = sqlx::query_as::<_, UserToken>(&query)
        .bind(token_hash)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(token)
}

pub async fn mark_used(
    tx: &mut Transaction<'_, Postgres>,
    kind: TokenKind,
    id: i32,
) -> Result<()> {
    let query = format!("UPDATE {} SET used_at = NOW() WHERE id = $1", kind.table());

    sqlx::query(&query).bind(id).execute(&mut **tx).await?;

    Ok(())
}

pub async fn cleanup_expired(pool: &PgPool, kind: TokenKind) -> Result<u64> {
    let query = format!("DELETE FROM {} WHERE expires_at < NOW()", kind.table());

    let result = sqlx::query(&query).execute(pool).await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::utils::tokens::issue_token;

    async fn user(pool: &PgPool) -> i32 {
        sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, email, password_hash)
             VALUES ('Bruno', 'Souza', 'bruno@example.com', 'x')
             RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap()
    }

    /// Runs the redemption transaction; true when the token was accepted.
    async fn redeem(pool: &PgPool, kind: TokenKind, token_hash: &str) -> bool {
        let mut tx = pool.begin().await.unwrap();

        let record = find_by_hash_for_update(&mut tx, kind, token_hash)
            .await
            .unwrap()
            .filter(|record| record.is_redeemable(Utc::now()));

        if let Some(record) = &record {
            mark_used(&mut tx, kind, record.id).await.unwrap();
        }

        tx.commit().await.unwrap();

        record.is_some()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_token_redeems_once(pool: PgPool) {
        let user_id = user(&pool).await;

        for kind in [TokenKind::PasswordReset, TokenKind::EmailVerification] {
            let issued = issue_token();
            create_token(&pool, kind, user_id, &issued.hash, Utc::now() + Duration::minutes(30))
                .await
                .unwrap();

            assert!(redeem(&pool, kind, &issued.hash).await, "{:?}", kind);
            assert!(!redeem(&pool, kind, &issued.hash).await, "{:?}", kind);
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_concurrent_redemption_waits_for_the_lock(pool: PgPool) {
        let user_id = user(&pool).await;
        let kind = TokenKind::PasswordReset;
        let issued = issue_token();
        create_token(&pool, kind, user_id, &issued.hash, Utc::now() + Duration::minutes(30))
            .await
            .unwrap();

        let mut first = pool.begin().await.unwrap();
        let record = find_by_hash_for_update(&mut first, kind, &issued.hash)
            .await
            .unwrap()
            .unwrap();

        let second = tokio::spawn({
            let pool = pool.clone();
            let hash = issued.hash.clone();
            async move { redeem(&pool, kind, &hash).await }
        });

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        mark_used(&mut first, kind, record.id).await.unwrap();
        first.commit().await.unwrap();

        assert!(!second.await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_expired_tokens_are_rejected_and_cleaned_up(pool: PgPool) {
        let user_id = user(&pool).await;
        let kind = TokenKind::EmailVerification;

        let expired = issue_token();
        create_token(&pool, kind, user_id, &expired.hash, Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        let live = issue_token();
        create_token(&pool, kind, user_id, &live.hash, Utc::now() + Duration::hours(24))
            .await
            .unwrap();

        assert!(!redeem(&pool, kind, &expired.hash).await);
        assert_eq!(cleanup_expired(&pool, kind).await.unwrap(), 1);
        assert!(redeem(&pool, kind, &live.hash).await);
    }
}
