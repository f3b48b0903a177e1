//! Routing worker thread.
//!
//! A single thread owns every reconsideration pass. Callers enqueue
//! [`Request`]s through a crossbeam channel; requests are served in order,
//! so a shutdown queued behind pending passes lets them complete first.

use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::RwLock;
use ruta_core::{RoutingEngine, RoutingReport};
use tracing::{debug, trace, warn};

/// Name given to the routing worker thread.
pub const WORKER_THREAD_NAME: &str = "ruta-routing";

/// Requests served by the routing worker.
pub(crate) enum Request {
    /// Run one pass; reply with its report when `done` is set.
    Reconsider {
        done: Option<Sender<RoutingReport>>,
    },
    /// Leave the loop.
    Shutdown,
}

/// Handle to a running worker.
pub(crate) struct Worker {
    tx: Sender<Request>,
    handle: JoinHandle<()>,
    thread_id: ThreadId,
}

impl Worker {
    /// Spawns the worker thread over `engine`.
    pub(crate) fn spawn(engine: Arc<RwLock<RoutingEngine>>) -> std::io::Result<Self> {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || run(&engine, &rx))?;
        let thread_id = handle.thread().id();
        debug!("routing worker started");
        Ok(Self {
            tx,
            handle,
            thread_id,
        })
    }

    /// Whether the caller runs on the worker thread.
    pub(crate) fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Enqueues a request. Returns `false` if the worker has exited.
    pub(crate) fn send(&self, request: Request) -> bool {
        self.tx.send(request).is_ok()
    }

    /// Enqueues shutdown and waits for the thread to exit.
    pub(crate) fn stop(self) {
        let _ = self.tx.send(Request::Shutdown);
        if self.handle.join().is_err() {
            warn!("routing worker panicked");
        }
        debug!("routing worker stopped");
    }
}

fn run(engine: &RwLock<RoutingEngine>, rx: &Receiver<Request>) {
    for request in rx {
        match request {
            Request::Reconsider { done } => {
                let report = engine.write().reconsider_routing();
                trace!(changed = report.changed, "pass served");
                if let Some(done) = done {
                    let _ = done.send(report);
                }
            }
            Request::Shutdown => break,
        }
    }
}
