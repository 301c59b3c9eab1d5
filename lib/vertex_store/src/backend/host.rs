//! In-memory backend.
//!
//! Keeps every allocation in host memory so buffers can be exercised and read
//! back without a GPU.

use std::{
  cell::{Cell, RefCell},
  collections::HashMap,
};

use log::{trace, warn};

use super::GraphicsBackend;
use crate::{buffer::UsageMode, error::BackendError};

/// Fill byte for freshly allocated storage, standing in for undefined contents.
pub const UNINITIALIZED_BYTE: u8 = 0xCD;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostBufferId(u64);

impl HostBufferId {
  pub fn id(&self) -> u64 {
    self.0
  }
}

#[derive(Debug)]
struct Allocation {
  label: String,
  storage: Option<Vec<u8>>,
  usage: UsageMode,
}

#[derive(Debug, Default)]
pub struct HostBackend {
  buffers: RefCell<HashMap<HostBufferId, Allocation>>,
  next_id: Cell<u64>,
}

impl HostBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of buffers created and not yet released.
  pub fn live_buffers(&self) -> usize {
    self.buffers.borrow().len()
  }

  /// Allocated storage size of a live buffer, in bytes.
  pub fn allocation_size(&self, handle: &HostBufferId) -> Option<u64> {
    self
      .buffers
      .borrow()
      .get(handle)
      .and_then(|allocation| allocation.storage.as_ref())
      .map(|storage| storage.len() as u64)
  }

  pub fn usage_of(&self, handle: &HostBufferId) -> Option<UsageMode> {
    self.buffers.borrow().get(handle).map(|allocation| allocation.usage)
  }

  fn with_storage<R>(
    &self,
    handle: &HostBufferId,
    offset: u64,
    len: u64,
    f: impl FnOnce(&mut [u8]) -> R,
  ) -> Result<R, BackendError> {
    let mut buffers = self.buffers.borrow_mut();
    let allocation = buffers
      .get_mut(handle)
      .ok_or(BackendError::UnknownHandle(handle.0))?;

    let Allocation { label, storage, .. } = allocation;
    let storage = storage
      .as_mut()
      .ok_or_else(|| BackendError::NotAllocated(label.clone()))?;

    let size = storage.len() as u64;
    match offset.checked_add(len) {
      Some(end) if end <= size => {
        Ok(f(&mut storage[offset as usize..end as usize]))
      }
      _ => Err(BackendError::OutOfBounds { offset, len, size }),
    }
  }
}

impl GraphicsBackend for HostBackend {
  type Handle = HostBufferId;

  fn name(&self) -> &'static str {
    "Host"
  }

  fn create_buffer(&self, label: &str) -> Result<HostBufferId, BackendError> {
    let id = HostBufferId(self.next_id.get());
    self.next_id.set(id.0 + 1);

    trace!("HostBackend: creating buffer {label:?} as {id:?}");
    self.buffers.borrow_mut().insert(
      id,
      Allocation {
        label: label.to_string(),
        storage: None,
        usage: UsageMode::default(),
      },
    );

    Ok(id)
  }

  fn allocate_storage(
    &self,
    handle: &mut HostBufferId,
    size: u64,
    usage: UsageMode,
  ) -> Result<(), BackendError> {
    let mut buffers = self.buffers.borrow_mut();
    let allocation = buffers
      .get_mut(handle)
      .ok_or(BackendError::UnknownHandle(handle.0))?;

    trace!(
      "HostBackend: allocating {size} bytes ({usage:?}) for {:?}",
      allocation.label
    );
    allocation.storage = Some(vec![UNINITIALIZED_BYTE; size as usize]);
    allocation.usage = usage;

    Ok(())
  }

  fn write_sub_range(
    &self,
    handle: &HostBufferId,
    offset: u64,
    bytes: &[u8],
  ) -> Result<(), BackendError> {
    trace!("HostBackend: writing {} bytes at {offset} to {handle:?}", bytes.len());
    self.with_storage(handle, offset, bytes.len() as u64, |range| {
      range.copy_from_slice(bytes)
    })
  }

  fn read_sub_range(
    &self,
    handle: &HostBufferId,
    offset: u64,
    size: u64,
  ) -> Result<Vec<u8>, BackendError> {
    self.with_storage(handle, offset, size, |range| range.to_vec())
  }

  fn release_buffer(&self, handle: HostBufferId) {
    match self.buffers.borrow_mut().remove(&handle) {
      Some(allocation) => {
        trace!("HostBackend: released {:?}", allocation.label)
      }
      None => warn!("HostBackend: release of unknown buffer {handle:?}"),
    }
  }
}
