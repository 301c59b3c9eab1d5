//! Vertex layout descriptors and GPU vertex storage buffers.
//!
//! - [`VertexLayout`] describes how one vertex record maps onto shader inputs
//! - [`VertexStorageBuffer`] owns a fixed-capacity allocation for records of one layout
//! - [`GraphicsBackend`] is the graphics API the buffer sits on, with a
//!   [`WgpuBackend`] for real devices and a [`HostBackend`] that keeps
//!   allocations in memory
//!
//! ```ignore
//! let backend = Rc::new(HostBackend::new());
//! let mut buffer =
//!   VertexStorageBuffer::new(backend, VertexPositionColor::LAYOUT, 4, UsageMode::Static)?;
//! buffer.upload_all(&quad)?;
//! buffer.release();
//! ```

pub mod backend;
pub mod buffer;
pub mod error;
pub mod layout;
pub mod record;

pub use backend::{
  host::{HostBackend, HostBufferId},
  wgpu_backend::{WgpuBackend, WgpuBackendOptions, WgpuBuffer},
  GraphicsBackend,
};
pub use buffer::{
  UsageMode, VertexStorageBuffer, VertexStorageBufferBuilder, MAX_VERTEX_COUNT,
  MIN_VERTEX_COUNT,
};
pub use error::{BackendError, Result, VertexBufferError};
pub use layout::{VertexAttribute, VertexLayout};
pub use record::{VertexPositionColor, VertexPositionTexture, VertexRecord};
