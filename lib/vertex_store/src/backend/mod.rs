//! The graphics API a [`VertexStorageBuffer`](crate::VertexStorageBuffer)
//! allocates from.
//!
//! Backends are bound to the thread that owns the graphics context. Buffers
//! share their backend through an `Rc`, which keeps them on that thread.

pub mod host;
pub mod wgpu_backend;

use std::fmt::Debug;

use crate::{buffer::UsageMode, error::BackendError};

pub trait GraphicsBackend {
  /// Opaque identifier of one buffer resource, owned by exactly one
  /// [`VertexStorageBuffer`](crate::VertexStorageBuffer).
  type Handle: Debug;

  fn name(&self) -> &'static str;

  /// Create a buffer resource without backing storage.
  fn create_buffer(&self, label: &str) -> Result<Self::Handle, BackendError>;

  /// Give the buffer `size` bytes of storage. Contents are undefined.
  fn allocate_storage(
    &self,
    handle: &mut Self::Handle,
    size: u64,
    usage: UsageMode,
  ) -> Result<(), BackendError>;

  /// Overwrite `bytes.len()` bytes of storage starting at `offset`.
  fn write_sub_range(
    &self,
    handle: &Self::Handle,
    offset: u64,
    bytes: &[u8],
  ) -> Result<(), BackendError>;

  /// Copy `size` bytes of storage starting at `offset` back to the host.
  fn read_sub_range(
    &self,
    handle: &Self::Handle,
    offset: u64,
    size: u64,
  ) -> Result<Vec<u8>, BackendError>;

  /// Free the buffer and its storage.
  fn release_buffer(&self, handle: Self::Handle);
}
