use crate::composer::Composer;

#[tokio::test]
async fn test_blank_draft_is_not_taken() {
    let composer = Composer::new();

    composer.set_draft("   \n\t ").await;
    assert!(composer.take_draft().await.is_none());

    // The blank draft stays in place rather than being consumed
    assert_eq!(composer.draft().await, "   \n\t ");
}

#[tokio::test]
async fn test_take_draft_clears_optimistically() {
    let composer = Composer::new();

    composer.set_draft("Hello").await;
    let taken = composer.take_draft().await.expect("draft should be taken");

    assert_eq!(taken, "Hello");
    assert_eq!(composer.draft().await, "", "input clears before the send resolves");
}

#[tokio::test]
async fn test_restore_after_failed_send() {
    let composer = Composer::new();

    composer.set_draft("Hello").await;
    let taken = composer.take_draft().await.expect("draft should be taken");

    // Send failed - the typed text comes back
    composer.restore_draft(taken).await;
    assert_eq!(composer.draft().await, "Hello");
}

#[tokio::test]
async fn test_restore_never_clobbers_newer_input() {
    let composer = Composer::new();

    composer.set_draft("first message").await;
    let taken = composer.take_draft().await.expect("draft should be taken");

    // The user started typing again while the send was in flight
    composer.set_draft("second message").await;

    composer.restore_draft(taken).await;
    assert_eq!(composer.draft().await, "second message");
}
