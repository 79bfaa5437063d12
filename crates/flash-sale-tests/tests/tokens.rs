use std::time::Duration;

use eyre::Result;
use flash_sale_tests::{ClaimOutcome, TestCtxBuilder};

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_expired_token_is_not_eligible() -> Result<()> {
    let ctx = TestCtxBuilder::new()
        .with_token_ttl(1)
        .with_sweep_interval(1)
        .build()
        .await?;
    ctx.api.init_stock("watch", 2).await??;

    let mut session = ctx.api.create_user_session();
    session.unlock("watch").await??;

    // let the token outlive its TTL
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(session.participate("watch").await??, ClaimOutcome::NotEligible);
    assert_eq!(ctx.api.get_stock("watch").await??, 2);

    // a fresh unlock is not affected by the expired one
    assert!(matches!(
        session.claim("watch").await??,
        ClaimOutcome::Claimed { remaining: 1 }
    ));

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_unlock_rate_gate_denies_excess_attempts() -> Result<()> {
    let ctx = TestCtxBuilder::new()
        .with_unlock_rate(1, 3_600)
        .build()
        .await?;
    ctx.api.init_stock("cap", 5).await??;

    let mut greedy = ctx.api.create_user_session();
    greedy.unlock("cap").await??;

    let err = greedy.unlock("cap").await?.unwrap_err();
    assert_eq!(err.code, "DENIED");

    // the first token is still good despite the denied second unlock
    assert!(matches!(
        greedy.participate("cap").await??,
        ClaimOutcome::Claimed { .. }
    ));

    // other users have their own budget
    let mut polite = ctx.api.create_user_session();
    assert!(matches!(
        polite.claim("cap").await??,
        ClaimOutcome::Claimed { .. }
    ));

    ctx.finish().await;
    Ok(())
}
