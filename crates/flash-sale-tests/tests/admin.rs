use std::time::{SystemTime, UNIX_EPOCH};

use eyre::Result;
use flash_sale_tests::{ClaimOutcome, TestCtxBuilder};

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_reset_clears_fully() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    ctx.api.init_stock("poster", 3).await??;

    let mut alice = ctx.api.create_user_session();
    let mut bob = ctx.api.create_user_session();
    alice.claim("poster").await??;
    bob.claim("poster").await??;
    assert_eq!(ctx.api.participants_count("poster").await??, 2);

    ctx.api.reset_flash_sale("poster", None).await??;

    assert_eq!(ctx.api.get_stock("poster").await??, 0);
    assert_eq!(ctx.api.participants_count("poster").await??, 0);
    assert!(!alice.check_participation("poster").await??);
    assert!(!bob.check_participation("poster").await??);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_reset_with_reinit_allows_a_new_run() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    ctx.api.init_stock("mug", 1).await??;

    let mut session = ctx.api.create_user_session();
    assert!(matches!(
        session.claim("mug").await??,
        ClaimOutcome::Claimed { remaining: 0 }
    ));

    ctx.api.reset_flash_sale("mug", Some(7)).await??;
    assert_eq!(ctx.api.get_stock("mug").await??, 7);

    // the earlier winner may enter the new run
    assert!(matches!(
        session.claim("mug").await??,
        ClaimOutcome::Claimed { remaining: 6 }
    ));

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_reinit_overwrites_stock_but_keeps_records() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    ctx.api.init_stock("pin", 5).await??;

    let mut session = ctx.api.create_user_session();
    session.claim("pin").await??;
    assert_eq!(ctx.api.get_stock("pin").await??, 4);

    // init-stock restocks without forgiving earlier participation
    ctx.api.init_stock("pin", 10).await??;
    assert_eq!(ctx.api.get_stock("pin").await??, 10);
    assert!(session.check_participation("pin").await??);
    assert_eq!(
        session.claim("pin").await??,
        ClaimOutcome::AlreadyParticipated
    );

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_reset_unknown_product_is_rejected() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;

    let err = ctx
        .api
        .reset_flash_sale("never-inited", None)
        .await?
        .unwrap_err();
    assert_eq!(err.code, "UNKNOWN_PRODUCT");

    let err = ctx
        .api
        .participants_count("never-inited")
        .await?
        .unwrap_err();
    assert_eq!(err.code, "UNKNOWN_PRODUCT");

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_set_start_time_opens_the_gate() -> Result<()> {
    let ctx = TestCtxBuilder::new().with_start_in(3_600).build().await?;
    ctx.api.init_stock("badge", 1).await??;

    let mut session = ctx.api.create_user_session();
    assert_eq!(session.claim("badge").await??, ClaimOutcome::NotStarted);

    ctx.api.set_start_time(unix_now().saturating_sub(1)).await??;

    assert!(matches!(
        session.claim("badge").await??,
        ClaimOutcome::Claimed { remaining: 0 }
    ));

    ctx.finish().await;
    Ok(())
}
