//! Shared fixtures: a mock-engine context and a readiness double that counts
//! its waits.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use zsock::prelude::*;
use zsock_core::mock::MockEngine;

type Hook = Box<dyn FnMut(usize) + Send>;

/// Readiness that completes immediately and records every wait.
#[derive(Default)]
pub struct CountingReadiness {
    waits: AtomicUsize,
    seen: Mutex<Vec<(RawFd, Interest)>>,
    hook: Mutex<Option<Hook>>,
}

impl CountingReadiness {
    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(RawFd, Interest)> {
        self.seen.lock().clone()
    }

    /// Run `hook` with the 1-based wait number on every wait.
    pub fn on_wait(&self, hook: impl FnMut(usize) + Send + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }
}

#[async_trait]
impl Readiness for CountingReadiness {
    async fn wait(&self, fd: RawFd, interest: Interest) -> io::Result<()> {
        let n = self.waits.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().push((fd, interest));
        if let Some(hook) = self.hook.lock().as_mut() {
            hook(n);
        }
        tokio::task::yield_now().await;
        Ok(())
    }
}

/// Readiness that never signals.
pub struct StalledReadiness;

#[async_trait]
impl Readiness for StalledReadiness {
    async fn wait(&self, _fd: RawFd, _interest: Interest) -> io::Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

pub fn setup() -> (Arc<MockEngine>, Arc<CountingReadiness>, Context) {
    zsock::dev_tracing::init_tracing();
    let engine = Arc::new(MockEngine::new());
    let readiness = Arc::new(CountingReadiness::default());
    let ctx = Context::with_engine(engine.clone(), ContextOptions::default())
        .unwrap()
        .with_readiness(readiness.clone());
    (engine, readiness, ctx)
}

/// Mock-engine context whose transfers and polls never see a wakeup.
pub fn stalled() -> (Arc<MockEngine>, Context) {
    zsock::dev_tracing::init_tracing();
    let engine = Arc::new(MockEngine::new());
    let ctx = Context::with_engine(engine.clone(), ContextOptions::default())
        .unwrap()
        .with_readiness(Arc::new(StalledReadiness));
    (engine, ctx)
}
