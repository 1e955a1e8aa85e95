//! Execution queues and completion events.
//!
//! A [`Queue`] is an in-order work queue bound to one device.  Work is
//! submitted without blocking and completes through an [`Event`], which
//! also carries the work's output back to the host.  Dropping a queue
//! drains the remaining work and joins its worker, so a queue can never
//! outlive the step that opened it.

use crate::memory::{DeviceBuffer, MemoryLedger};
use mcm_core::{errors::Result, DeviceId, Error};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Execution context bound to one device.
pub struct Queue {
    device: DeviceId,
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    ledger: Arc<MemoryLedger>,
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("device", &self.device)
            .field("open", &self.sender.is_some())
            .finish()
    }
}

impl Queue {
    pub(crate) fn open(device: DeviceId, ledger: Arc<MemoryLedger>) -> Result<Self> {
        let (sender, jobs) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name(format!("mcm-queue-{device}"))
            .spawn(move || {
                for job in jobs {
                    job();
                }
            })
            .map_err(|e| Error::device(device, format!("failed to start queue worker: {e}")))?;
        tracing::debug!(device, "queue opened");
        Ok(Self {
            device,
            sender: Some(sender),
            worker: Some(worker),
            ledger,
        })
    }

    /// Device the queue is bound to.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Enqueue `work` and return its completion event.
    ///
    /// A panic inside `work` is caught on the worker and surfaces as an
    /// [`Error::Device`] from [`Event::wait`].
    pub fn submit<T, F>(&self, work: F) -> Result<Event<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let device = self.device;
        let (done, completion) = mpsc::channel();
        let job: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
                Err(Error::device(
                    device,
                    format!("work panicked: {}", panic_message(payload.as_ref())),
                ))
            });
            // nobody waiting is fine
            let _ = done.send(outcome);
        });
        self.sender
            .as_ref()
            .ok_or_else(|| Error::device(device, "queue is closed"))?
            .send(job)
            .map_err(|_| Error::device(device, "queue worker is gone"))?;
        Ok(Event {
            device,
            completion,
            ready: None,
        })
    }

    /// Allocate `len` elements on the device, each set to `value`.
    pub fn alloc<T: Clone>(&self, len: usize, value: T) -> DeviceBuffer<T> {
        DeviceBuffer::new(self.device, Arc::clone(&self.ledger), len, vec![value; len])
    }

    /// Allocate a buffer sized for `host` and enqueue the copy into it.
    pub fn upload<T>(&self, host: &[T]) -> Result<(DeviceBuffer<T>, Event<()>)>
    where
        T: Clone + Send + 'static,
    {
        let buffer = DeviceBuffer::new(
            self.device,
            Arc::clone(&self.ledger),
            host.len(),
            Vec::with_capacity(host.len()),
        );
        let staged = host.to_vec();
        let view = buffer.view();
        let copied = self.submit(move || view.write(|dst| *dst = staged))?;
        Ok((buffer, copied))
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        // closing the channel lets the worker drain and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!(device = self.device, "queue worker terminated abnormally");
            }
        }
        tracing::debug!(device = self.device, "queue closed");
    }
}

/// Completion marker of work submitted to a [`Queue`].
#[must_use = "an event must be waited on before its output is used"]
pub struct Event<T> {
    device: DeviceId,
    completion: Receiver<Result<T>>,
    ready: Option<Result<T>>,
}

impl<T> std::fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("device", &self.device)
            .field("ready", &self.ready.is_some())
            .finish()
    }
}

impl<T> Event<T> {
    /// Device the work ran on.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Non-blocking completion check.
    pub fn poll(&mut self) -> bool {
        if self.ready.is_some() {
            return true;
        }
        match self.completion.try_recv() {
            Ok(outcome) => {
                self.ready = Some(outcome);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.ready = Some(Err(self.terminated()));
                true
            }
        }
    }

    /// Block until the work has completed and return its output.
    pub fn wait(mut self) -> Result<T> {
        match self.ready.take() {
            Some(outcome) => outcome,
            None => self.completion.recv().map_err(|_| self.terminated())?,
        }
    }

    fn terminated(&self) -> Error {
        Error::device(self.device, "queue worker terminated before completion")
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
