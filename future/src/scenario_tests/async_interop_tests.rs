// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Round trips between the listener-based futures and async Rust on tokio.

use crate::{error::{FutureError, cause_from_message},
            future::Future};
use pretty_assertions::assert_eq;
use tokio::runtime::Handle;

/// Terminal outcomes survive a round trip through the async bridge (outcome
/// equality, not object identity).
#[tokio::test]
async fn round_trip_preserves_terminal_outcomes() {
    let handle = Handle::current();

    // Success.
    let succeeded = Future::succeeded(7);
    let back = Future::from_async_result(&handle, succeeded.as_async());
    assert_eq!(back.as_async().await.unwrap(), 7);

    // Failure, same message through the trip.
    let failed: Future<i32> = Future::failed(cause_from_message("boom"));
    let back = Future::from_async_result(&handle, failed.as_async());
    match back.as_async().await.unwrap_err() {
        FutureError::Failed { cause } => assert!(cause.to_string().contains("boom")),
        other => panic!("expected Failed, got {other:?}"),
    }

    // Cancellation.
    let cancelled: Future<i32> = Future::cancelled();
    let back = Future::from_async_result(&handle, cancelled.as_async());
    assert!(back.as_async().await.is_err());
    assert!(back.is_cancelled());
}

/// A settable future completed from a blocking thread resolves an `.await` on the
/// async side.
#[tokio::test]
async fn blocking_producer_wakes_async_consumer() {
    let future = Future::<String>::new();
    {
        let future = future.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            future.try_succeed("hello".to_string());
        });
    }
    assert_eq!(future.as_async().await.unwrap(), "hello");
}

/// An async task feeds the blocking side through `from_async`.
#[tokio::test]
async fn async_producer_feeds_blocking_consumer() {
    let handle = Handle::current();
    let future = Future::from_async(&handle, async {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        21 * 2
    });
    let value = tokio::task::spawn_blocking(move || future.get())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value, 42);
}

/// Cancelling the bridged future aborts the tokio task behind it.
#[tokio::test]
async fn cancelling_bridge_aborts_the_task() {
    let handle = Handle::current();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let future = Future::from_async(&handle, async move {
        // Held open until aborted; the sender dropping signals that.
        let _tx = tx;
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        0
    });

    assert!(future.cancel(false));
    // Abort drops the task, which drops the sender.
    assert!(rx.await.is_err());
    assert!(future.is_cancelled());
}
