//! Device-resident memory.
//!
//! A [`DeviceBuffer`] owns an allocation on one device and returns it to
//! the device's ledger when dropped, so every exit path of a driver,
//! including failures and panics, releases what it allocated.  Kernels
//! running on the queue worker reach the data through a cloned
//! [`BufferView`].

use mcm_core::{errors::Result, DeviceId, Error};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Per-device allocation accounting.
#[derive(Debug, Default)]
pub(crate) struct MemoryLedger {
    bytes: AtomicUsize,
    live: AtomicUsize,
}

impl MemoryLedger {
    fn acquire(&self, bytes: usize) {
        self.bytes.fetch_add(bytes, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self, bytes: usize) {
        self.bytes.fetch_sub(bytes, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn bytes(&self) -> usize {
        self.bytes.load(Ordering::SeqCst)
    }

    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// An allocation of `len` elements of `T` on one device.
#[derive(Debug)]
pub struct DeviceBuffer<T> {
    device: DeviceId,
    len: usize,
    bytes: usize,
    data: Arc<Mutex<Vec<T>>>,
    ledger: Arc<MemoryLedger>,
}

impl<T> DeviceBuffer<T> {
    pub(crate) fn new(device: DeviceId, ledger: Arc<MemoryLedger>, len: usize, data: Vec<T>) -> Self {
        let bytes = len * std::mem::size_of::<T>();
        ledger.acquire(bytes);
        Self {
            device,
            len,
            bytes,
            data: Arc::new(Mutex::new(data)),
            ledger,
        }
    }

    /// Device the buffer lives on.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Number of elements the allocation was sized for.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the allocation holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the allocation in bytes.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// A handle kernels use to reach the buffer from the queue worker.
    pub fn view(&self) -> BufferView<T> {
        BufferView {
            device: self.device,
            data: Arc::clone(&self.data),
        }
    }
}

impl<T> Drop for DeviceBuffer<T> {
    fn drop(&mut self) {
        self.ledger.release(self.bytes);
        tracing::trace!(device = self.device, bytes = self.bytes, "device buffer released");
    }
}

/// Shared access to the contents of a [`DeviceBuffer`].
#[derive(Debug)]
pub struct BufferView<T> {
    device: DeviceId,
    data: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for BufferView<T> {
    fn clone(&self) -> Self {
        Self {
            device: self.device,
            data: Arc::clone(&self.data),
        }
    }
}

impl<T> BufferView<T> {
    /// Run `f` over the buffer contents.
    pub fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> Result<R> {
        let guard = self
            .data
            .lock()
            .map_err(|_| Error::device(self.device, "device buffer poisoned"))?;
        Ok(f(&guard))
    }

    /// Run `f` over the mutable buffer contents.
    pub fn write<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<R> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| Error::device(self.device, "device buffer poisoned"))?;
        Ok(f(&mut guard))
    }
}
