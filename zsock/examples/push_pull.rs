//! PUSH/PULL pipeline over libzmq
//!
//! A ventilator pushes jobs to a worker over inproc; the worker's receives
//! suspend on the socket descriptor until each job arrives.
//!
//! # Run
//!
//! ```sh
//! RUST_LOG=zsock=debug cargo run --example push_pull --features libzmq
//! ```

use zsock::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    zsock::dev_tracing::init_tracing();
    println!("=== PUSH/PULL Demo (libzmq {:?}) ===\n", zsock::version());

    let ctx = Context::new(1)?;
    let opts = SocketOptions::new().with_linger(Some(std::time::Duration::ZERO));

    let worker = ctx.socket_with_options::<Pull>(&opts)?;
    worker.bind("inproc://jobs")?;
    let ventilator = ctx.socket_with_options::<Push>(&opts)?;
    ventilator.connect("inproc://jobs")?;

    let send = async {
        for n in 1..=5 {
            let id = n.to_string();
            ventilator
                .send_lazy(["job-", id.as_str()], SendFlags::empty())
                .await?;
            println!("   [Ventilator] queued job-{}", n);
        }
        ventilator
            .send_multipart(["report", "done"], SendFlags::empty())
            .await?;
        Ok::<_, ZsockError>(())
    };

    let receive = async {
        for _ in 0..5 {
            let job = worker.receive(RecvFlags::empty()).await?;
            println!("   [Worker] got {}", String::from_utf8_lossy(&job));
        }
        let frames = worker.receive_multipart(RecvFlags::empty()).await?;
        println!("   [Worker] final message has {} frames", frames.len());
        Ok::<_, ZsockError>(())
    };

    let (sent, received) = tokio::join!(send, receive);
    sent?;
    received?;

    worker.close()?;
    ventilator.close()?;
    drop((worker, ventilator));
    ctx.term()?;
    println!("\n✓ Done");
    Ok(())
}
