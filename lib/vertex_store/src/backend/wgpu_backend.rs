use std::iter;

use log::{debug, trace};

use super::GraphicsBackend;
use crate::{
  buffer::UsageMode,
  error::{BackendError, Result},
  layout::VertexLayout,
};

#[derive(Debug, Clone, Copy)]
pub struct WgpuBackendOptions {
  pub power_preference: wgpu::PowerPreference,
  /// Ask for a software adapter instead of real hardware.
  pub force_fallback_adapter: bool,
}

impl Default for WgpuBackendOptions {
  fn default() -> Self {
    Self {
      power_preference: wgpu::PowerPreference::default(),
      force_fallback_adapter: false,
    }
  }
}

///
/// A buffer resource on a [`WgpuBackend`].
///
/// wgpu sizes a buffer when it is created, so the `wgpu::Buffer` only exists
/// once storage has been allocated.
///
#[derive(Debug)]
pub struct WgpuBuffer {
  label: String,
  buffer: Option<wgpu::Buffer>,
}

impl WgpuBuffer {
  pub fn label(&self) -> &str {
    &self.label
  }

  /// The underlying buffer, for `RenderPass::set_vertex_buffer`.
  pub fn buffer(&self) -> Option<&wgpu::Buffer> {
    self.buffer.as_ref()
  }

  fn allocated(&self) -> Result<&wgpu::Buffer, BackendError> {
    self
      .buffer
      .as_ref()
      .ok_or_else(|| BackendError::NotAllocated(self.label.clone()))
  }
}

#[derive(Debug)]
pub struct WgpuBackend {
  device: wgpu::Device,
  queue: wgpu::Queue,
}

impl WgpuBackend {
  pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
    Self { device, queue }
  }

  /// Create a device without a surface.
  pub async fn headless(
    options: WgpuBackendOptions,
  ) -> Result<Self, BackendError> {
    let instance = wgpu::Instance::default();

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: options.power_preference,
        compatible_surface: None,
        force_fallback_adapter: options.force_fallback_adapter,
      })
      .await
      .ok_or(BackendError::AdapterNotFound)?;

    debug!("WgpuBackend: using adapter {:?}", adapter.get_info());

    let (device, queue) = adapter
      .request_device(&wgpu::DeviceDescriptor::default(), None)
      .await
      .map_err(|err| BackendError::DeviceCreationFailed(err.to_string()))?;

    Ok(Self::new(device, queue))
  }

  pub fn device(&self) -> &wgpu::Device {
    &self.device
  }

  pub fn queue(&self) -> &wgpu::Queue {
    &self.queue
  }
}

impl GraphicsBackend for WgpuBackend {
  type Handle = WgpuBuffer;

  fn name(&self) -> &'static str {
    "wgpu"
  }

  fn create_buffer(&self, label: &str) -> Result<WgpuBuffer, BackendError> {
    Ok(WgpuBuffer {
      label: label.to_string(),
      buffer: None,
    })
  }

  fn allocate_storage(
    &self,
    handle: &mut WgpuBuffer,
    size: u64,
    usage: UsageMode,
  ) -> Result<(), BackendError> {
    // wgpu has no usage hints; streaming and static buffers differ only in label.
    let label = format!("{} ({usage:?})", handle.label);
    trace!("WgpuBackend: allocating {size} bytes for {label:?}");

    let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
      label: Some(&label),
      size,
      usage: wgpu::BufferUsages::VERTEX
        | wgpu::BufferUsages::COPY_DST
        | wgpu::BufferUsages::COPY_SRC,
      mapped_at_creation: false,
    });

    if let Some(previous) = handle.buffer.replace(buffer) {
      previous.destroy();
    }

    Ok(())
  }

  fn write_sub_range(
    &self,
    handle: &WgpuBuffer,
    offset: u64,
    bytes: &[u8],
  ) -> Result<(), BackendError> {
    let buffer = handle.allocated()?;
    check_range(buffer, offset, bytes.len() as u64)?;

    trace!(
      "WgpuBackend: writing {} bytes at {offset} to {:?}",
      bytes.len(),
      handle.label
    );
    self.queue.write_buffer(buffer, offset, bytes);

    Ok(())
  }

  fn read_sub_range(
    &self,
    handle: &WgpuBuffer,
    offset: u64,
    size: u64,
  ) -> Result<Vec<u8>, BackendError> {
    let buffer = handle.allocated()?;
    check_range(buffer, offset, size)?;

    // A vertex buffer cannot be mapped directly; copy through a staging buffer.
    let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Staging Buffer for read back"),
      size,
      usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
      mapped_at_creation: false,
    });

    let mut encoder =
      self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Read Back Encoder"),
      });
    encoder.copy_buffer_to_buffer(buffer, offset, &staging_buffer, 0, size);

    // Pending write_buffer calls are flushed ahead of this submission.
    self.queue.submit(iter::once(encoder.finish()));

    let buffer_slice = staging_buffer.slice(..);

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
      let _ = tx.send(result);
    });
    self.device.poll(wgpu::Maintain::Wait);

    match pollster::block_on(rx.receive()) {
      Some(Ok(())) => {}
      Some(Err(err)) => return Err(BackendError::MapFailed(err.to_string())),
      None => {
        return Err(BackendError::MapFailed("map callback dropped".to_string()))
      }
    }

    let bytes = buffer_slice.get_mapped_range().to_vec();
    staging_buffer.unmap();
    staging_buffer.destroy();

    Ok(bytes)
  }

  fn release_buffer(&self, handle: WgpuBuffer) {
    trace!("WgpuBackend: releasing {:?}", handle.label);
    if let Some(buffer) = handle.buffer {
      buffer.destroy();
    }
  }
}

fn check_range(
  buffer: &wgpu::Buffer,
  offset: u64,
  len: u64,
) -> Result<(), BackendError> {
  let size = buffer.size();
  if offset.checked_add(len).map_or(true, |end| end > size) {
    return Err(BackendError::OutOfBounds { offset, len, size });
  }

  let alignment = wgpu::COPY_BUFFER_ALIGNMENT;
  if offset % alignment != 0 || len % alignment != 0 {
    return Err(BackendError::Misaligned {
      offset,
      len,
      alignment,
    });
  }

  Ok(())
}

/// The wgpu format of an attribute with `component_count` floats.
pub fn vertex_format(component_count: u32) -> Option<wgpu::VertexFormat> {
  match component_count {
    1 => Some(wgpu::VertexFormat::Float32),
    2 => Some(wgpu::VertexFormat::Float32x2),
    3 => Some(wgpu::VertexFormat::Float32x3),
    4 => Some(wgpu::VertexFormat::Float32x4),
    _ => None,
  }
}

///
/// Translate a layout into the attributes of a `wgpu::VertexBufferLayout`,
/// validating it first.
///
pub fn vertex_attributes(
  layout: &VertexLayout,
) -> Result<Vec<wgpu::VertexAttribute>> {
  layout.validate()?;

  Ok(
    layout
      .attributes()
      .iter()
      .filter_map(|attribute| {
        vertex_format(attribute.component_count).map(|format| {
          wgpu::VertexAttribute {
            format,
            offset: attribute.byte_offset,
            shader_location: attribute.binding_index,
          }
        })
      })
      .collect(),
  )
}

/// Describe a buffer of `layout` records to a render pipeline.
pub fn vertex_buffer_layout<'a>(
  layout: &VertexLayout,
  attributes: &'a [wgpu::VertexAttribute],
) -> wgpu::VertexBufferLayout<'a> {
  wgpu::VertexBufferLayout {
    array_stride: layout.size_in_bytes(),
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{VertexPositionColor, VertexRecord};

  #[test]
  fn test_vertex_attributes_follow_layout() {
    let attributes = vertex_attributes(&VertexPositionColor::LAYOUT).unwrap();
    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes[0].format, wgpu::VertexFormat::Float32x2);
    assert_eq!(attributes[0].offset, 0);
    assert_eq!(attributes[1].format, wgpu::VertexFormat::Float32x4);
    assert_eq!(attributes[1].offset, 8);
    assert_eq!(attributes[1].shader_location, 1);

    let buffer_layout =
      vertex_buffer_layout(&VertexPositionColor::LAYOUT, &attributes);
    assert_eq!(buffer_layout.array_stride, 24);
  }

  #[test]
  fn test_vertex_attributes_reject_invalid_layout() {
    let layout = VertexLayout::new("Nothing", &[]);
    assert!(vertex_attributes(&layout).is_err());
  }

  #[test]
  fn test_vertex_format_bounds() {
    assert_eq!(vertex_format(3), Some(wgpu::VertexFormat::Float32x3));
    assert_eq!(vertex_format(0), None);
    assert_eq!(vertex_format(5), None);
  }

  #[test]
  #[ignore = "requires a GPU adapter"]
  fn test_gpu_write_read_back() {
    let backend = pollster::block_on(WgpuBackend::headless(
      WgpuBackendOptions::default(),
    ))
    .unwrap();

    let mut handle = backend.create_buffer("gpu test").unwrap();
    backend
      .allocate_storage(&mut handle, 16, UsageMode::Static)
      .unwrap();
    backend.write_sub_range(&handle, 4, &[1, 2, 3, 4]).unwrap();

    let bytes = backend.read_sub_range(&handle, 4, 4).unwrap();
    assert_eq!(bytes, [1, 2, 3, 4]);

    assert!(matches!(
      backend.read_sub_range(&handle, 2, 4),
      Err(BackendError::Misaligned { .. })
    ));
    backend.release_buffer(handle);
  }
}
