use std::rc::Rc;

use log::info;
use vertex_store::{
  GraphicsBackend, UsageMode, VertexPositionColor, VertexRecord,
  VertexStorageBuffer,
};

// 左上、右上、右下、左下
pub const VERTICES: &[VertexPositionColor] = &[
  VertexPositionColor::new([-0.5, 0.5], [1.0, 0.0, 0.0, 1.0]),
  VertexPositionColor::new([0.5, 0.5], [0.0, 1.0, 0.0, 1.0]),
  VertexPositionColor::new([0.5, -0.5], [0.0, 0.0, 1.0, 1.0]),
  VertexPositionColor::new([-0.5, -0.5], [0.0, 0.0, 1.0, 1.0]),
];

// 2枚の三角形で四角形を作る
// 頂点を使い回すので、頂点は4つで済む
pub const INDICES: &[u16] = &[0, 1, 2, 0, 2, 3];

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedQuad {
  pub vertices: Vec<VertexPositionColor>,
  pub indices: Vec<u16>,
}

/// Every index must point at an uploaded vertex.
pub fn check_indices(indices: &[u16], vertex_count: usize) -> anyhow::Result<()> {
  if let Some(index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
    anyhow::bail!(
      "index {index} is out of range for {vertex_count} uploaded vertices"
    );
  }
  Ok(())
}

pub fn run<B: GraphicsBackend>(backend: Rc<B>) -> anyhow::Result<IndexedQuad> {
  let buffer = VertexStorageBuffer::new(
    backend,
    VertexPositionColor::LAYOUT,
    VERTICES.len(),
    UsageMode::Static,
  )?;

  let vertices = buffer.scope(|buffer| {
    buffer.upload_all(VERTICES)?;
    check_indices(INDICES, buffer.len())?;
    Ok::<_, anyhow::Error>(buffer.read_records::<VertexPositionColor>()?)
  })?;

  info!(
    "ch03-vertex-color: {} vertices, {} indices ({} triangles)",
    vertices.len(),
    INDICES.len(),
    INDICES.len() / 3
  );

  Ok(IndexedQuad {
    vertices,
    indices: INDICES.to_vec(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use vertex_store::HostBackend;

  #[test]
  fn test_quad_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = Rc::new(HostBackend::new());

    let quad = run(Rc::clone(&backend)).unwrap();

    assert_eq!(quad.vertices, VERTICES);
    assert_eq!(quad.indices, [0, 1, 2, 0, 2, 3]);
    assert_eq!(backend.live_buffers(), 0);
  }

  #[test]
  fn test_check_indices() {
    assert!(check_indices(INDICES, 4).is_ok());
    assert!(check_indices(INDICES, 3).is_err());
    assert!(check_indices(&[], 0).is_ok());
  }
}
