//! Polling sockets of different patterns together
//!
//! A PULL socket and a SUB socket share one poll; whichever becomes readable
//! is drained first.
//!
//! # Run
//!
//! ```sh
//! cargo run --example poll_many --features libzmq
//! ```

use std::time::Duration;
use zsock::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    zsock::dev_tracing::init_tracing();
    println!("=== Poll Demo ===\n");

    let ctx = Context::new(1)?;
    let (jobs, feeder) = ctx.pair::<Pull, Push>("inproc://poll-jobs")?;
    let (publisher, updates) = ctx.pair::<Pub, Sub>("inproc://poll-updates")?;
    updates.subscribe(b"")?;

    // let the subscription propagate before publishing
    tokio::time::sleep(Duration::from_millis(50)).await;
    feeder.send(b"job-1", SendFlags::empty()).await?;
    publisher.send(b"status: green", SendFlags::empty()).await?;

    let mut remaining = 2;
    while remaining > 0 {
        let items = [
            jobs.as_poll_item(PollEvent::In),
            updates.as_poll_item(PollEvent::In),
        ];
        let ready = ctx.poll(&items, 1000).await?;
        if ready.iter().all(|item| item.events().is_none()) {
            println!("   (timed out)");
            break;
        }
        if ready[0].events() == PollEvent::In {
            let job = jobs.receive(RecvFlags::empty()).await?;
            println!("   [PULL] {}", String::from_utf8_lossy(&job));
            remaining -= 1;
        }
        if ready[1].events() == PollEvent::In {
            let update = updates.receive(RecvFlags::empty()).await?;
            println!("   [SUB] {}", String::from_utf8_lossy(&update));
            remaining -= 1;
        }
    }

    println!("\n✓ Done");
    Ok(())
}
