use std::rc::Rc;

use log::info;
use vertex_store::{
  GraphicsBackend, UsageMode, VertexAttribute, VertexLayout, VertexRecord,
  VertexStorageBuffer,
};

// 位置だけを持つ頂点
// シェーダ側では @location(0) vec3<f32> として受け取る
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPosition {
  pub position: [f32; 3],
}

impl VertexPosition {
  const ATTRIBUTES: [VertexAttribute; 1] =
    [VertexAttribute::new("Position", 0, 3, 0)];
}

impl VertexRecord for VertexPosition {
  const LAYOUT: VertexLayout =
    VertexLayout::new("VertexPosition", &Self::ATTRIBUTES);
}

// 反時計回り：上、右下、左下
pub const VERTICES: &[VertexPosition] = &[
  VertexPosition {
    position: [0.0, 0.5, 0.0],
  },
  VertexPosition {
    position: [0.5, -0.5, 0.0],
  },
  VertexPosition {
    position: [-0.5, -0.5, 0.0],
  },
];

///
/// Upload the triangle once into a static buffer and return what the backend
/// holds afterwards.
///
pub fn run<B: GraphicsBackend>(
  backend: Rc<B>,
) -> anyhow::Result<Vec<VertexPosition>> {
  let buffer = VertexStorageBuffer::new(
    backend,
    VertexPosition::LAYOUT,
    VERTICES.len(),
    UsageMode::Static,
  )?;

  let vertices = buffer.scope(|buffer| {
    buffer.upload_all(VERTICES)?;
    buffer.read_records::<VertexPosition>()
  })?;

  info!(
    "ch01-triangle: {} vertices, {} bytes each",
    vertices.len(),
    VertexPosition::LAYOUT.size_in_bytes()
  );

  Ok(vertices)
}
