use eyre::Result;
use flash_sale_tests::{ClaimOutcome, StartTime, TestCtxBuilder};

#[tokio::test] // Every test function needs to be decorated with this attribute
#[ntest::timeout(20_000)] // Test timeout in ms
async fn test_basic_claim_flow() -> Result<()> {
    // Create a test context with the sale already open
    let ctx = TestCtxBuilder::new().build().await?;

    assert_eq!(ctx.api.health_check().await??, "UP");
    assert!(
        matches!(ctx.api.get_start_time().await??, StartTime::Scheduled(_)),
        "The builder schedules a start time, so one must be reported."
    );

    ctx.api.init_stock("keyboard", 5).await??;
    assert_eq!(ctx.api.get_stock("keyboard").await??, 5);

    // Create a new user session and claim one unit
    let mut session = ctx.api.create_user_session();
    session.unlock("keyboard").await??;
    match session.participate("keyboard").await?? {
        ClaimOutcome::Claimed { remaining } => assert_eq!(remaining, 4),
        outcome => panic!("It must be possible to claim a unit, got {outcome:?}"),
    }

    assert!(
        session.check_participation("keyboard").await??,
        "A successful claim must be visible through checkParticipation."
    );
    assert_eq!(ctx.api.get_stock("keyboard").await??, 4);

    // Finish the test
    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_unscheduled_sale_reports_no_start_time() -> Result<()> {
    let ctx = TestCtxBuilder::new().not_scheduled().build().await?;

    assert_eq!(ctx.api.get_start_time().await??, StartTime::NotScheduled);

    ctx.finish().await;
    Ok(())
}
