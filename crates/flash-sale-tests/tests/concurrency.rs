use eyre::Result;
use flash_sale_tests::{ClaimOutcome, TestCtxBuilder};
use futures::future::join_all;

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_two_users_one_unit() -> Result<()> {
    let ctx = TestCtxBuilder::new().with_handler_threads(4).build().await?;
    ctx.api.init_stock("ticket", 1).await??;

    let mut alice = ctx.api.create_user_session();
    let mut bob = ctx.api.create_user_session();
    alice.unlock("ticket").await??;
    bob.unlock("ticket").await??;

    // fire both claim attempts at the same instant
    let (a, b) = tokio::join!(alice.participate("ticket"), bob.participate("ticket"));
    let (a, b) = (a??, b??);

    let claimed = |outcome: &ClaimOutcome| matches!(outcome, ClaimOutcome::Claimed { .. });
    assert!(
        claimed(&a) ^ claimed(&b),
        "Exactly one of the two concurrent claims must succeed, got {a:?} / {b:?}"
    );
    assert!(
        a == ClaimOutcome::SoldOut || b == ClaimOutcome::SoldOut,
        "The loser must see SOLD_OUT, got {a:?} / {b:?}"
    );

    assert_eq!(ctx.api.get_stock("ticket").await??, 0);
    let alice_has = alice.check_participation("ticket").await??;
    let bob_has = bob.check_participation("ticket").await??;
    assert!(alice_has ^ bob_has);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(40_000)]
async fn test_burst_never_oversells() -> Result<()> {
    const STOCK: u64 = 8;
    const USERS: usize = 64;

    let ctx = TestCtxBuilder::new().with_handler_threads(8).build().await?;
    ctx.api.init_stock("drop", STOCK).await??;

    let mut sessions: Vec<_> = (0..USERS).map(|_| ctx.api.create_user_session()).collect();

    let outcomes = join_all(sessions.iter_mut().map(|s| s.claim("drop"))).await;

    let mut successes = 0u64;
    let mut sold_out = 0u64;
    for outcome in outcomes {
        match outcome?? {
            ClaimOutcome::Claimed { .. } => successes += 1,
            ClaimOutcome::SoldOut => sold_out += 1,
            outcome => panic!("Unexpected outcome in burst: {outcome:?}"),
        }
    }

    assert_eq!(
        successes, STOCK,
        "The count of successful claims must equal the initialized quantity."
    );
    assert_eq!(sold_out, USERS as u64 - STOCK);
    assert_eq!(ctx.api.get_stock("drop").await??, 0);
    assert_eq!(ctx.api.participants_count("drop").await??, STOCK);

    // winners retry and must be deduplicated; losers must hold no record
    for session in &mut sessions {
        if session.check_participation("drop").await?? {
            assert_eq!(
                session.claim("drop").await??,
                ClaimOutcome::AlreadyParticipated
            );
        } else {
            assert_eq!(session.claim("drop").await??, ClaimOutcome::SoldOut);
        }
    }
    assert_eq!(ctx.api.get_stock("drop").await??, 0);
    assert_eq!(ctx.api.participants_count("drop").await??, STOCK);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(40_000)]
async fn test_reset_under_concurrent_claims() -> Result<()> {
    const USERS: usize = 32;

    let ctx = TestCtxBuilder::new().with_handler_threads(8).build().await?;
    ctx.api.init_stock("flashlight", 4).await??;

    let mut sessions: Vec<_> = (0..USERS).map(|_| ctx.api.create_user_session()).collect();

    // claims race against an admin reset; whatever interleaving happens,
    // afterwards the ledger and the registry must agree
    let claims = join_all(sessions.iter_mut().map(|s| s.claim("flashlight")));
    let reset = ctx.api.reset_flash_sale("flashlight", Some(4));
    let (outcomes, reset) = tokio::join!(claims, reset);
    reset??;
    for outcome in outcomes {
        outcome??;
    }

    let remaining = ctx.api.get_stock("flashlight").await??;
    let participants = ctx.api.participants_count("flashlight").await??;
    assert_eq!(
        remaining + participants,
        4,
        "Post-reset claims and remaining stock must account for the re-init quantity."
    );

    ctx.finish().await;
    Ok(())
}
