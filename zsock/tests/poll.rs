mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{setup, stalled};
use zsock::prelude::*;
use zsock_core::mock::MockEngine;

#[tokio::test]
async fn test_poll_round_trip() {
    let (engine, _, ctx) = setup();
    let jobs = ctx.socket::<Pull>().unwrap();
    let feed = ctx.socket::<Sub>().unwrap();
    let out = ctx.socket::<Push>().unwrap();
    engine.set_ready(jobs.as_raw(), EventFlags::POLLIN);
    engine.set_ready(out.as_raw(), EventFlags::POLLOUT);
    engine.set_fd_ready(7, EventFlags::POLLIN | EventFlags::POLLOUT);

    let items = [
        jobs.as_poll_item(PollEvent::In),
        feed.as_poll_item(PollEvent::In),
        PollItem::file(7, PollEvent::InOut),
        out.as_poll_item(PollEvent::Out),
    ];
    let ready = ctx.poll(&items, 0).await.unwrap();

    assert_eq!(ready.len(), items.len());
    let events: Vec<_> = ready.iter().map(PollItem::events).collect();
    assert_eq!(
        events,
        vec![PollEvent::In, PollEvent::None, PollEvent::InOut, PollEvent::Out]
    );

    // entries keep their source, in order
    assert_eq!(ready[0].socket().unwrap().as_raw(), jobs.as_raw());
    assert_eq!(ready[1].socket().unwrap().socket_type(), SocketType::Sub);
    assert_eq!(ready[2].fd(), Some(7));
    assert_eq!(ready[3].socket().unwrap().as_raw(), out.as_raw());
}

#[tokio::test]
async fn test_requested_events_mask_observed() {
    let (engine, _, ctx) = setup();
    let pair = ctx.socket::<Pair>().unwrap();
    engine.set_ready(pair.as_raw(), EventFlags::POLLIN | EventFlags::POLLOUT);

    let ready = ctx.poll(&[pair.as_poll_item(PollEvent::Out)], 0).await.unwrap();
    assert_eq!(ready[0].events(), PollEvent::Out);

    let ready = ctx.poll(&[pair.as_poll_item(PollEvent::None)], 0).await.unwrap();
    assert!(ready[0].events().is_none());
}

#[tokio::test]
async fn test_descriptor_error_condition() {
    let (engine, _, ctx) = setup();
    engine.set_fd_ready(9, EventFlags::POLLERR);
    engine.set_fd_ready(10, EventFlags::POLLIN | EventFlags::POLLERR);

    let items = [
        PollItem::file(9, PollEvent::Native),
        PollItem::file(10, PollEvent::In),
    ];
    let ready = ctx.poll(&items, 0).await.unwrap();
    assert_eq!(ready[0].events(), PollEvent::Native);
    assert_eq!(ready[1].events(), PollEvent::In);
}

#[tokio::test]
async fn test_interrupted_poll_is_retried() {
    let (engine, _, ctx) = setup();
    let rep = ctx.socket::<Rep>().unwrap();
    engine.set_ready(rep.as_raw(), EventFlags::POLLIN);
    engine.interrupt_polls(2);

    let ready = ctx.poll(&[rep.as_poll_item(PollEvent::In)], 0).await.unwrap();
    assert_eq!(ready[0].events(), PollEvent::In);
    assert_eq!(engine.poll_calls(), 3);
}

#[tokio::test]
async fn test_timed_poll_returns_once_ready() {
    let (engine, _, ctx) = setup();
    let xsub = ctx.socket::<XSub>().unwrap();
    engine.set_ready(xsub.as_raw(), EventFlags::POLLOUT);
    engine.interrupt_polls(1);

    let ready = ctx
        .poll(&[xsub.as_poll_item(PollEvent::InOut)], 100)
        .await
        .unwrap();
    assert_eq!(ready[0].events(), PollEvent::Out);
    assert_eq!(engine.poll_calls(), 2);
}

#[tokio::test]
async fn test_closed_socket_is_rejected_before_engine() {
    let (engine, _, ctx) = setup();
    let open = ctx.socket::<Pull>().unwrap();
    let closed = ctx.socket::<Pull>().unwrap();
    closed.close().unwrap();

    let items = [
        open.as_poll_item(PollEvent::In),
        closed.as_poll_item(PollEvent::In),
    ];
    let err = ctx.poll(&items, 0).await.unwrap_err();
    assert!(err.is_resource_error());
    assert_eq!(err.to_string(), "poll: use of closed socket");
    assert_eq!(engine.poll_calls(), 0);
}

#[tokio::test]
async fn test_engine_failure_is_io_error() {
    let (engine, _, ctx) = setup();
    let pair = ctx.socket::<Pair>().unwrap();
    engine.fail_next_poll(EngineError::native(14, "Bad address"));

    let err = ctx
        .poll(&[pair.as_poll_item(PollEvent::In)], 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ZsockError::Io { op: "poll", .. }));
}

#[tokio::test]
async fn test_socket_from_other_context_is_rejected() {
    let (_, _, ctx) = setup();
    let other = Context::with_engine(Arc::new(MockEngine::new()), ContextOptions::default()).unwrap();
    let foreign = other.socket::<Pub>().unwrap();

    let err = ctx
        .poll(&[foreign.as_poll_item(PollEvent::Out)], 0)
        .await
        .unwrap_err();
    assert!(err.is_resource_error());
}

#[tokio::test]
async fn test_empty_poll() {
    let (_, _, ctx) = setup();
    let ready = ctx.poll(&[], 0).await.unwrap();
    assert!(ready.is_empty());
}

#[tokio::test]
async fn test_poll_wakes_on_socket_signal() {
    let (engine, readiness, ctx) = setup();
    let pull = ctx.socket::<Pull>().unwrap();
    let raw = pull.as_raw();

    let feeder = engine.clone();
    readiness.on_wait(move |n| {
        if n == 2 {
            feeder.set_ready(raw, EventFlags::POLLIN);
        }
    });

    let ready = ctx
        .poll(&[pull.as_poll_item(PollEvent::In)], -1)
        .await
        .unwrap();
    assert_eq!(ready[0].events(), PollEvent::In);
    assert_eq!(readiness.waits(), 2);
    assert_eq!(engine.poll_calls(), 3);
    assert!(readiness
        .seen()
        .iter()
        .all(|seen| *seen == (MockEngine::fd_of(raw), Interest::Readable)));
}

#[tokio::test]
async fn test_poll_waits_on_descriptor_direction() {
    let (engine, readiness, ctx) = setup();
    let feeder = engine.clone();
    readiness.on_wait(move |_| feeder.set_fd_ready(12, EventFlags::POLLOUT));

    let items = [
        PollItem::file(12, PollEvent::Out),
        PollItem::file(12, PollEvent::Out),
    ];
    let ready = ctx.poll(&items, 1000).await.unwrap();
    assert_eq!(ready[0].events(), PollEvent::Out);
    assert_eq!(readiness.seen(), vec![(12, Interest::Writable)]);
}

#[tokio::test]
async fn test_timed_poll_expires_with_nothing_ready() {
    let (engine, ctx) = stalled();
    let sub = ctx.socket::<Sub>().unwrap();

    let ready = ctx
        .poll(&[sub.as_poll_item(PollEvent::In)], 30)
        .await
        .unwrap();
    assert!(ready[0].events().is_none());
    // once up front, once after the deadline
    assert_eq!(engine.poll_calls(), 2);
}

#[tokio::test]
async fn test_interrupts_do_not_extend_the_timeout() {
    let (engine, ctx) = stalled();
    let rep = ctx.socket::<Rep>().unwrap();
    engine.interrupt_polls(3);

    let started = tokio::time::Instant::now();
    let ready = ctx
        .poll(&[rep.as_poll_item(PollEvent::In)], 40)
        .await
        .unwrap();
    assert!(ready[0].events().is_none());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(engine.poll_calls(), 5);
}

#[tokio::test]
async fn test_cancelled_poll_leaves_socket_usable() {
    let (engine, ctx) = stalled();
    let pull = ctx.socket::<Pull>().unwrap();

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        ctx.poll(&[pull.as_poll_item(PollEvent::In)], -1),
    )
    .await;
    assert!(outcome.is_err());
    assert_eq!(engine.poll_calls(), 1);

    pull.set_option(SocketOption::Linger(0)).unwrap();
    assert_eq!(
        pull.get_option(OptionName::Linger).unwrap(),
        SocketOption::Linger(0)
    );
    engine.set_ready(pull.as_raw(), EventFlags::POLLIN);
    let ready = ctx.poll(&[pull.as_poll_item(PollEvent::In)], 0).await.unwrap();
    assert_eq!(ready[0].events(), PollEvent::In);
}

#[tokio::test]
async fn test_close_while_polling_fails_the_poll() {
    let (engine, ctx) = stalled();
    let pull = ctx.socket::<Pull>().unwrap();
    let items = [pull.as_poll_item(PollEvent::In)];

    let (polled, closed) = tokio::join!(ctx.poll(&items, -1), async {
        tokio::task::yield_now().await;
        pull.close()
    });

    closed.unwrap();
    let err = polled.unwrap_err();
    assert!(err.is_resource_error());
    assert_eq!(err.to_string(), "poll: use of closed socket");
    assert_eq!(engine.poll_calls(), 1);
}
