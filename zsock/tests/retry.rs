//! Blocking-looking transfers over the non-blocking engine.

mod common;

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use common::{setup, stalled, StalledReadiness};
use zsock::prelude::*;
use zsock_core::mock::MockEngine;

#[tokio::test]
async fn test_each_would_block_costs_one_wait() {
    let (engine, readiness, ctx) = setup();
    let (_pull, push) = ctx.pair::<Pull, Push>("inproc://retry").unwrap();
    engine.would_block_sends(3);

    push.send(b"eventually", SendFlags::empty()).await.unwrap();

    assert_eq!(readiness.waits(), 3);
    assert_eq!(engine.send_calls(), 4);
    assert_eq!(engine.sent(push.as_raw()), vec![Bytes::from_static(b"eventually")]);
}

#[tokio::test]
async fn test_transfers_never_block_the_engine() {
    let (engine, _, ctx) = setup();
    let (_pull, push) = ctx.pair::<Pull, Push>("inproc://dontwait").unwrap();

    push.send(b"a", SendFlags::empty()).await.unwrap();
    push.send(b"b", SendFlags::SEND_MORE).await.unwrap();

    let flags = engine.sent_flags(push.as_raw());
    assert!(flags.iter().all(|f| f.contains(SendFlags::DONT_WAIT)));
    assert!(flags[1].contains(SendFlags::SEND_MORE));
}

#[tokio::test]
async fn test_waits_on_socket_descriptor() {
    let (engine, readiness, ctx) = setup();
    let (pull, push) = ctx.pair::<Pull, Push>("inproc://fd").unwrap();
    engine.would_block_sends(1);
    engine.would_block_recvs(1);

    push.send(b"x", SendFlags::empty()).await.unwrap();
    pull.receive(RecvFlags::empty()).await.unwrap();

    assert_eq!(
        readiness.seen(),
        vec![
            (MockEngine::fd_of(push.as_raw()), Interest::Writable),
            (MockEngine::fd_of(pull.as_raw()), Interest::Readable),
        ]
    );
}

#[tokio::test]
async fn test_receive_resumes_when_frame_arrives() {
    let (engine, readiness, ctx) = setup();
    let pull = ctx.socket::<Pull>().unwrap();
    let raw = pull.as_raw();

    let feeder = engine.clone();
    readiness.on_wait(move |n| {
        if n == 2 {
            feeder.push_incoming(raw, b"late frame", false);
        }
    });

    let frame = pull.receive(RecvFlags::empty()).await.unwrap();
    assert_eq!(frame, Bytes::from_static(b"late frame"));
    assert_eq!(readiness.waits(), 2);
    assert_eq!(engine.recv_calls(), 3);
}

#[tokio::test]
async fn test_spurious_wakeups_wait_again() {
    let (engine, readiness, ctx) = setup();
    let sub = ctx.socket::<Sub>().unwrap();
    engine.push_incoming(sub.as_raw(), b"tick", false);
    engine.would_block_recvs(1);
    // woken with nothing to read, then with only the wrong direction
    engine.script_events(
        sub.as_raw(),
        [EventFlags::empty(), EventFlags::POLLOUT, EventFlags::POLLIN],
    );

    let frame = sub.receive(RecvFlags::empty()).await.unwrap();
    assert_eq!(frame, Bytes::from_static(b"tick"));
    assert_eq!(readiness.waits(), 3);
    assert_eq!(engine.recv_calls(), 2);
}

#[tokio::test]
async fn test_interrupted_transfer_is_retried() {
    let (engine, readiness, ctx) = setup();
    let rep = ctx.socket::<Rep>().unwrap();
    engine.push_incoming(rep.as_raw(), b"request", false);
    engine.fail_next_recv(EngineError::Interrupted);

    let frame = rep.receive(RecvFlags::empty()).await.unwrap();
    assert_eq!(frame, Bytes::from_static(b"request"));
    assert_eq!(readiness.waits(), 1);
}

#[tokio::test]
async fn test_hard_failure_ends_the_loop() {
    let (engine, readiness, ctx) = setup();
    let req = ctx.socket::<Req>().unwrap();
    engine.fail_next_send(EngineError::native(
        156_384_763,
        "Operation cannot be accomplished in current state",
    ));

    let err = req.send(b"hello", SendFlags::empty()).await.unwrap_err();
    match err {
        ZsockError::Io { op, source } => {
            assert_eq!(op, "send");
            assert_eq!(source.code(), 156_384_763);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(readiness.waits(), 0);
    assert_eq!(engine.live_messages(), 0);
}

#[tokio::test]
async fn test_timeout_error_after_retries() {
    let (engine, readiness, ctx) = setup();
    let pull = ctx.socket::<Pull>().unwrap();
    engine.would_block_recvs(2);

    // a receive timeout surfaces as a hard error once the engine gives up
    let expiring = engine.clone();
    readiness.on_wait(move |n| {
        if n == 2 {
            expiring.fail_next_recv(EngineError::native(110, "Connection timed out"));
        }
    });

    let err = pull.receive(RecvFlags::empty()).await.unwrap_err();
    assert_eq!(err.op(), Some("receive"));
    assert_eq!(readiness.waits(), 2);
    assert_eq!(engine.recv_calls(), 3);
    assert_eq!(engine.live_messages(), 0);
}

#[tokio::test]
async fn test_receive_buffer_released_on_every_path() {
    let (engine, _, ctx) = setup();
    let (pull, push) = ctx.pair::<Pull, Push>("inproc://buffers").unwrap();

    push.send(b"one", SendFlags::empty()).await.unwrap();
    pull.receive(RecvFlags::empty()).await.unwrap();
    assert_eq!(engine.live_messages(), 0);

    engine.fail_next_recv(EngineError::native(14, "Bad address"));
    pull.receive(RecvFlags::empty()).await.unwrap_err();
    assert_eq!(engine.live_messages(), 0);
}

#[tokio::test]
async fn test_cancelled_receive_releases_buffer() {
    let engine = Arc::new(MockEngine::new());
    let ctx = Context::with_engine(engine.clone(), ContextOptions::default())
        .unwrap()
        .with_readiness(Arc::new(StalledReadiness));
    let pull = ctx.socket::<Pull>().unwrap();

    let outcome =
        tokio::time::timeout(Duration::from_millis(20), pull.receive(RecvFlags::empty())).await;
    assert!(outcome.is_err());
    assert_eq!(engine.live_messages(), 0);
    assert_eq!(engine.recv_calls(), 1);
}

#[tokio::test]
async fn test_send_lazy_concatenates_chunks() {
    let (engine, _, ctx) = setup();
    let (_pull, push) = ctx.pair::<Pull, Push>("inproc://lazy").unwrap();

    push.send_lazy(["hello", ", ", "world"], SendFlags::empty())
        .await
        .unwrap();

    assert_eq!(
        engine.sent(push.as_raw()),
        vec![Bytes::from_static(b"hello, world")]
    );
}

#[tokio::test]
async fn test_multipart_round_trip() {
    let (engine, _, ctx) = setup();
    let (router, dealer) = ctx.pair::<Router, Dealer>("inproc://multipart").unwrap();

    dealer
        .send_multipart(
            [
                Bytes::from_static(b"header"),
                Bytes::new(),
                Bytes::from_static(b"body"),
            ],
            SendFlags::empty(),
        )
        .await
        .unwrap();

    let flags = engine.sent_flags(dealer.as_raw());
    assert!(flags[0].contains(SendFlags::SEND_MORE));
    assert!(flags[1].contains(SendFlags::SEND_MORE));
    assert!(!flags[2].contains(SendFlags::SEND_MORE));

    let frames = router.receive_multipart(RecvFlags::empty()).await.unwrap();
    assert_eq!(
        frames,
        vec![
            Bytes::from_static(b"header"),
            Bytes::new(),
            Bytes::from_static(b"body"),
        ]
    );
    assert!(!router.more().unwrap());
}

#[tokio::test]
async fn test_empty_multipart_sends_nothing() {
    let (engine, _, ctx) = setup();
    let push = ctx.socket::<Push>().unwrap();
    push.send_multipart(Vec::<Vec<u8>>::new(), SendFlags::empty())
        .await
        .unwrap();
    assert_eq!(engine.send_calls(), 0);
}

#[tokio::test]
async fn test_close_wakes_suspended_receive() {
    let (engine, ctx) = stalled();
    let pull = ctx.socket::<Pull>().unwrap();
    let raw = pull.as_raw();

    let (received, closed) = tokio::join!(pull.receive(RecvFlags::empty()), async {
        tokio::task::yield_now().await;
        pull.close()
    });

    closed.unwrap();
    let err = received.unwrap_err();
    assert!(err.is_resource_error());
    assert_eq!(err.to_string(), "receive: use of closed socket");
    assert_eq!(engine.recv_calls(), 1);
    assert_eq!(engine.close_calls(raw), 1);
    assert_eq!(engine.live_messages(), 0);
}

#[tokio::test]
async fn test_close_wakes_suspended_send() {
    let (engine, ctx) = stalled();
    let push = ctx.socket::<Push>().unwrap();
    engine.would_block_sends(10);

    let (sent, closed) = tokio::join!(push.send(b"stuck", SendFlags::empty()), async {
        tokio::task::yield_now().await;
        push.close()
    });

    closed.unwrap();
    assert_eq!(sent.unwrap_err().op(), Some("send"));
    assert_eq!(engine.send_calls(), 1);
    assert_eq!(engine.live_messages(), 0);
}
