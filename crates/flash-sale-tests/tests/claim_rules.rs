use eyre::Result;
use flash_sale_tests::{ClaimOutcome, TestCtxBuilder};

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_at_most_one_claim_per_user() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    ctx.api.init_stock("gpu", 2).await??;

    let mut session = ctx.api.create_user_session();
    assert!(matches!(
        session.claim("gpu").await??,
        ClaimOutcome::Claimed { remaining: 1 }
    ));

    // a retry with a fresh token must be rejected without touching stock
    assert_eq!(
        session.claim("gpu").await??,
        ClaimOutcome::AlreadyParticipated
    );
    assert_eq!(ctx.api.get_stock("gpu").await??, 1);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_sold_out_leaves_no_orphan_claim() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    ctx.api.init_stock("vinyl", 1).await??;

    let mut winner = ctx.api.create_user_session();
    assert!(matches!(
        winner.claim("vinyl").await??,
        ClaimOutcome::Claimed { remaining: 0 }
    ));

    let mut loser = ctx.api.create_user_session();
    assert_eq!(loser.claim("vinyl").await??, ClaimOutcome::SoldOut);

    // the loser got nothing, so no participation record may survive
    assert!(!loser.check_participation("vinyl").await??);
    assert!(winner.check_participation("vinyl").await??);
    assert_eq!(ctx.api.get_stock("vinyl").await??, 0);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_participate_before_start_mutates_nothing() -> Result<()> {
    let ctx = TestCtxBuilder::new().with_start_in(3_600).build().await?;
    ctx.api.init_stock("sneaker", 3).await??;

    let mut session = ctx.api.create_user_session();
    session.unlock("sneaker").await??;
    assert_eq!(
        session.participate("sneaker").await??,
        ClaimOutcome::NotStarted
    );

    assert_eq!(ctx.api.get_stock("sneaker").await??, 3);
    assert!(!session.check_participation("sneaker").await??);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_token_is_required_and_single_use() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    ctx.api.init_stock("console", 5).await??;

    let mut session = ctx.api.create_user_session();

    // no unlock happened yet
    assert_eq!(
        session.participate_with("console", None).await??,
        ClaimOutcome::NotEligible
    );

    let token = session.unlock("console").await??;
    assert!(matches!(
        session.participate("console").await??,
        ClaimOutcome::Claimed { .. }
    ));

    // the token was spent by the successful claim
    assert_eq!(
        session.participate_with("console", Some(token)).await??,
        ClaimOutcome::NotEligible
    );

    // a token is bound to the user it was issued to
    let thief = ctx.api.create_user_session();
    assert_eq!(
        thief.participate_with("console", Some(token)).await??,
        ClaimOutcome::NotEligible
    );
    assert!(!thief.check_participation("console").await??);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_reads_are_idempotent() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;
    ctx.api.init_stock("lamp", 4).await??;

    let mut session = ctx.api.create_user_session();
    session.claim("lamp").await??;

    let first = ctx.api.get_stock("lamp").await??;
    let second = ctx.api.get_stock("lamp").await??;
    assert_eq!(first, second);

    let first = session.check_participation("lamp").await??;
    let second = session.check_participation("lamp").await??;
    assert_eq!(first, second);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_unknown_product_and_invalid_input() -> Result<()> {
    let ctx = TestCtxBuilder::new().build().await?;

    let err = ctx.api.get_stock("ghost").await?.unwrap_err();
    assert_eq!(err.code, "UNKNOWN_PRODUCT");

    let session = ctx.api.create_user_session();
    let err = session.check_participation("ghost").await?.unwrap_err();
    assert_eq!(err.code, "UNKNOWN_PRODUCT");

    // claiming a product nobody initialized behaves like an exhausted one
    let mut session = ctx.api.create_user_session();
    assert_eq!(session.claim("ghost").await??, ClaimOutcome::SoldOut);

    let err = ctx
        .api
        .init_stock_without_quantity("ghost")
        .await?
        .unwrap_err();
    assert_eq!(err.code, "INVALID_INPUT");

    ctx.finish().await;
    Ok(())
}
