use std::{mem, rc::Rc};

use log::{debug, warn};

use crate::{
  backend::GraphicsBackend,
  error::{Result, VertexBufferError},
  layout::VertexLayout,
  record::VertexRecord,
};

pub const MIN_VERTEX_COUNT: usize = 1;
pub const MAX_VERTEX_COUNT: usize = 100_000;

/// How often the buffer contents are expected to change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UsageMode {
  /// Set once, drawn many times.
  #[default]
  Static,
  /// Rewritten about every frame.
  Streaming,
}

pub struct VertexStorageBufferBuilder<'a> {
  layout: VertexLayout,
  capacity: usize,
  usage: UsageMode,
  label: Option<&'a str>,
}

impl<'a> VertexStorageBufferBuilder<'a> {
  pub fn new(layout: VertexLayout) -> Self {
    Self {
      layout,
      capacity: MIN_VERTEX_COUNT,
      usage: UsageMode::Static,
      label: None,
    }
  }

  ///
  /// Set the maximum number of records the buffer holds.
  ///
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  ///
  /// Mark the contents as rewritten frequently.
  ///
  pub fn streaming(mut self) -> Self {
    self.usage = UsageMode::Streaming;
    self
  }

  pub fn set_usage(mut self, usage: UsageMode) -> Self {
    self.usage = usage;
    self
  }

  ///
  /// Set the label of the buffer. Defaults to the layout's record name.
  ///
  pub fn set_label(mut self, label: &'a str) -> Self {
    self.label = Some(label);
    self
  }

  pub fn build<B: GraphicsBackend>(
    &self,
    backend: Rc<B>,
  ) -> Result<VertexStorageBuffer<B>> {
    VertexStorageBuffer::with_label(
      backend,
      self.layout,
      self.capacity,
      self.usage,
      self.label.unwrap_or(self.layout.record()),
    )
  }
}

///
/// A fixed-capacity graphics allocation holding records of one
/// [`VertexLayout`].
///
/// The buffer exclusively owns its backend handle. Call [`release`] (or use
/// [`scope`]) before the buffer goes out of scope; dropping an unreleased
/// buffer releases it too, but logs a warning.
///
/// After release, [`upload`], [`read_back`], [`read_records`] and [`handle`]
/// fail with [`VertexBufferError::UseAfterRelease`]. The accessors keep
/// answering from the buffer's description.
///
/// [`release`]: VertexStorageBuffer::release
/// [`scope`]: VertexStorageBuffer::scope
/// [`upload`]: VertexStorageBuffer::upload
/// [`read_back`]: VertexStorageBuffer::read_back
/// [`read_records`]: VertexStorageBuffer::read_records
/// [`handle`]: VertexStorageBuffer::handle
///
pub struct VertexStorageBuffer<B: GraphicsBackend> {
  backend: Rc<B>,
  handle: Option<B::Handle>,
  layout: VertexLayout,
  capacity: usize,
  usage: UsageMode,
  len: usize,
  label: String,
}

impl<B: GraphicsBackend> VertexStorageBuffer<B> {
  pub fn new(
    backend: Rc<B>,
    layout: VertexLayout,
    capacity: usize,
    usage: UsageMode,
  ) -> Result<Self> {
    Self::with_label(backend, layout, capacity, usage, layout.record())
  }

  pub fn with_label(
    backend: Rc<B>,
    layout: VertexLayout,
    capacity: usize,
    usage: UsageMode,
    label: &str,
  ) -> Result<Self> {
    if !(MIN_VERTEX_COUNT..=MAX_VERTEX_COUNT).contains(&capacity) {
      return Err(VertexBufferError::InvalidArgument(format!(
        "capacity {capacity} is outside {MIN_VERTEX_COUNT}..={MAX_VERTEX_COUNT}"
      )));
    }
    layout.validate()?;

    let size = capacity as u64 * layout.size_in_bytes();

    let mut handle = backend.create_buffer(label)?;
    if let Err(err) = backend.allocate_storage(&mut handle, size, usage) {
      backend.release_buffer(handle);
      return Err(err.into());
    }

    debug!(
      "Created vertex buffer {label:?} on {}: {capacity} x {} ({size} bytes, {usage:?})",
      backend.name(),
      layout.record(),
    );

    Ok(Self {
      backend,
      handle: Some(handle),
      layout,
      capacity,
      usage,
      len: 0,
      label: label.to_string(),
    })
  }

  ///
  /// Overwrite the first `count` records of the buffer with `records`.
  ///
  /// Everything is validated before any data is transferred, so a rejected
  /// upload leaves the buffer contents as they were. Storage past `count`
  /// records keeps its previous contents.
  ///
  pub fn upload<T: VertexRecord>(
    &mut self,
    records: &[T],
    count: usize,
  ) -> Result<()> {
    let handle = self.live_handle()?;
    self.check_record::<T>()?;

    if records.is_empty() {
      return Err(VertexBufferError::InvalidArgument(
        "no records to upload".to_string(),
      ));
    }

    let max = self.capacity.min(records.len());
    if count == 0 || count > max {
      return Err(VertexBufferError::OutOfRange {
        what: "count",
        value: count,
        max,
      });
    }

    let bytes: &[u8] = bytemuck::cast_slice(&records[..count]);
    self.backend.write_sub_range(handle, 0, bytes)?;
    self.len = count;

    debug!("Uploaded {count} records to {:?}", self.label);
    Ok(())
  }

  pub fn upload_all<T: VertexRecord>(&mut self, records: &[T]) -> Result<()> {
    self.upload(records, records.len())
  }

  /// The whole backing storage, including bytes past [`len`](Self::len).
  pub fn read_back(&self) -> Result<Vec<u8>> {
    let handle = self.live_handle()?;
    Ok(self.backend.read_sub_range(handle, 0, self.size_in_bytes())?)
  }

  /// The records written by the last upload.
  pub fn read_records<T: VertexRecord>(&self) -> Result<Vec<T>> {
    let handle = self.live_handle()?;
    self.check_record::<T>()?;

    if self.len == 0 {
      return Ok(Vec::new());
    }

    let size = self.len as u64 * self.layout.size_in_bytes();
    let bytes = self.backend.read_sub_range(handle, 0, size)?;

    Ok(
      bytes
        .chunks_exact(mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect(),
    )
  }

  ///
  /// Give the handle back to the backend. Calling this again is a no-op.
  ///
  pub fn release(&mut self) {
    if let Some(handle) = self.handle.take() {
      debug!("Releasing vertex buffer {:?}", self.label);
      self.backend.release_buffer(handle);
      self.len = 0;
    }
  }

  ///
  /// Run `f` with the buffer and release it afterwards, whether `f`
  /// succeeded or not.
  ///
  pub fn scope<R, E>(
    mut self,
    f: impl FnOnce(&mut Self) -> std::result::Result<R, E>,
  ) -> std::result::Result<R, E> {
    let result = f(&mut self);
    self.release();
    result
  }

  pub fn handle(&self) -> Result<&B::Handle> {
    self.live_handle()
  }

  pub fn layout(&self) -> &VertexLayout {
    &self.layout
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Number of records written by the last successful upload.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn usage(&self) -> UsageMode {
    self.usage
  }

  /// Size of the backing storage in bytes.
  pub fn size_in_bytes(&self) -> u64 {
    self.capacity as u64 * self.layout.size_in_bytes()
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn is_released(&self) -> bool {
    self.handle.is_none()
  }

  /// The record type must carry this buffer's layout and match its size.
  fn check_record<T: VertexRecord>(&self) -> Result<()> {
    if T::LAYOUT != self.layout {
      return Err(VertexBufferError::TypeMismatch {
        expected: self.layout.record(),
        found: T::LAYOUT.record(),
      });
    }

    if mem::size_of::<T>() as u64 != self.layout.size_in_bytes() {
      return Err(VertexBufferError::InvalidLayout {
        record: self.layout.record(),
        reason: format!(
          "record is {} bytes but the layout describes {}",
          mem::size_of::<T>(),
          self.layout.size_in_bytes()
        ),
      });
    }

    Ok(())
  }

  fn live_handle(&self) -> Result<&B::Handle> {
    self
      .handle
      .as_ref()
      .ok_or_else(|| VertexBufferError::UseAfterRelease(self.label.clone()))
  }
}

impl<B: GraphicsBackend> Drop for VertexStorageBuffer<B> {
  fn drop(&mut self) {
    if self.handle.is_some() {
      warn!(
        "Vertex buffer {:?} dropped without release, releasing it now",
        self.label
      );
      self.release();
    }
  }
}

impl<B: GraphicsBackend> std::fmt::Debug for VertexStorageBuffer<B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("VertexStorageBuffer")
      .field("label", &self.label)
      .field("record", &self.layout.record())
      .field("capacity", &self.capacity)
      .field("len", &self.len)
      .field("usage", &self.usage)
      .field("handle", &self.handle)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    backend::host::HostBackend,
    record::{VertexPositionColor, VertexPositionTexture},
  };

  fn quad() -> [VertexPositionColor; 4] {
    [
      VertexPositionColor::new([-0.5, 0.5], [1.0, 0.0, 0.0, 1.0]),
      VertexPositionColor::new([0.5, 0.5], [0.0, 1.0, 0.0, 1.0]),
      VertexPositionColor::new([0.5, -0.5], [0.0, 0.0, 1.0, 1.0]),
      VertexPositionColor::new([-0.5, -0.5], [0.0, 0.0, 1.0, 1.0]),
    ]
  }

  #[test]
  fn test_builder_defaults() {
    let backend = Rc::new(HostBackend::new());
    let mut buffer = VertexStorageBufferBuilder::new(VertexPositionColor::LAYOUT)
      .build(Rc::clone(&backend))
      .unwrap();

    assert_eq!(buffer.capacity(), MIN_VERTEX_COUNT);
    assert_eq!(buffer.usage(), UsageMode::Static);
    assert_eq!(buffer.label(), "VertexPositionColor");
    buffer.release();
  }

  #[test]
  fn test_builder_settings_reach_the_backend() {
    let backend = Rc::new(HostBackend::new());
    let mut buffer = VertexStorageBufferBuilder::new(VertexPositionColor::LAYOUT)
      .capacity(16)
      .streaming()
      .set_label("quad")
      .build(Rc::clone(&backend))
      .unwrap();

    let handle = *buffer.handle().unwrap();
    assert_eq!(buffer.label(), "quad");
    assert_eq!(backend.allocation_size(&handle), Some(16 * 24));
    assert_eq!(backend.usage_of(&handle), Some(UsageMode::Streaming));
    buffer.release();
  }

  #[test]
  fn test_partial_upload_tracks_len() {
    let backend = Rc::new(HostBackend::new());
    let mut buffer = VertexStorageBuffer::new(
      backend,
      VertexPositionColor::LAYOUT,
      4,
      UsageMode::Static,
    )
    .unwrap();
    assert!(buffer.is_empty());

    let quad = quad();
    buffer.upload_all(&quad).unwrap();
    assert_eq!(buffer.len(), 4);

    buffer.upload(&quad[2..], 1).unwrap();
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.read_records::<VertexPositionColor>().unwrap(), [quad[2]]);

    // Records past len keep their earlier contents.
    let bytes = buffer.read_back().unwrap();
    assert_eq!(&bytes[24..], bytemuck::cast_slice::<_, u8>(&quad[1..]));
    buffer.release();
  }

  #[test]
  fn test_read_records_checks_type() {
    let backend = Rc::new(HostBackend::new());
    let mut buffer = VertexStorageBuffer::new(
      backend,
      VertexPositionColor::LAYOUT,
      4,
      UsageMode::Static,
    )
    .unwrap();

    assert_eq!(
      buffer.read_records::<VertexPositionTexture>(),
      Err(VertexBufferError::TypeMismatch {
        expected: "VertexPositionColor",
        found: "VertexPositionTexture",
      })
    );
    buffer.release();
  }

  #[test]
  fn test_count_beyond_records_is_out_of_range() {
    let backend = Rc::new(HostBackend::new());
    let mut buffer = VertexStorageBuffer::new(
      backend,
      VertexPositionColor::LAYOUT,
      8,
      UsageMode::Static,
    )
    .unwrap();

    assert_eq!(
      buffer.upload(&quad(), 5),
      Err(VertexBufferError::OutOfRange {
        what: "count",
        value: 5,
        max: 4,
      })
    );
    buffer.release();
  }

  #[test]
  fn test_drop_releases_as_last_resort() {
    let backend = Rc::new(HostBackend::new());
    {
      let _buffer = VertexStorageBuffer::new(
        Rc::clone(&backend),
        VertexPositionColor::LAYOUT,
        4,
        UsageMode::Static,
      )
      .unwrap();
      assert_eq!(backend.live_buffers(), 1);
    }
    assert_eq!(backend.live_buffers(), 0);
  }

  #[test]
  fn test_debug_output() {
    let backend = Rc::new(HostBackend::new());
    let mut buffer = VertexStorageBuffer::new(
      backend,
      VertexPositionTexture::LAYOUT,
      2,
      UsageMode::Static,
    )
    .unwrap();

    let debug = format!("{buffer:?}");
    assert!(debug.contains("VertexPositionTexture"));
    assert!(debug.contains("capacity: 2"));
    buffer.release();
  }
}
