use crate::layout::{VertexAttribute, VertexLayout};

///
/// A vertex record that can be uploaded into a
/// [`VertexStorageBuffer`](crate::VertexStorageBuffer).
///
/// The record must be `#[repr(C)]` plain old data whose size equals
/// `LAYOUT.size_in_bytes()`.
///
pub trait VertexRecord: bytemuck::Pod {
  const LAYOUT: VertexLayout;
}

/// A 2D position with an RGBA color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPositionColor {
  pub position: [f32; 2],
  pub color: [f32; 4],
}

impl VertexPositionColor {
  const ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute::new("Position", 0, 2, 0),
    VertexAttribute::new("Color", 1, 4, 2 * 4),
  ];

  pub const fn new(position: [f32; 2], color: [f32; 4]) -> Self {
    Self { position, color }
  }
}

impl VertexRecord for VertexPositionColor {
  const LAYOUT: VertexLayout =
    VertexLayout::new("VertexPositionColor", &Self::ATTRIBUTES);
}

/// A 2D position with a texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPositionTexture {
  pub position: [f32; 2],
  pub tex_coord: [f32; 2],
}

impl VertexPositionTexture {
  const ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute::new("Position", 0, 2, 0),
    VertexAttribute::new("TexCoord", 1, 2, 2 * 4),
  ];

  pub const fn new(position: [f32; 2], tex_coord: [f32; 2]) -> Self {
    Self {
      position,
      tex_coord,
    }
  }
}

impl VertexRecord for VertexPositionTexture {
  const LAYOUT: VertexLayout =
    VertexLayout::new("VertexPositionTexture", &Self::ATTRIBUTES);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_layouts_match_struct_sizes() {
    assert_eq!(
      VertexPositionColor::LAYOUT.size_in_bytes(),
      std::mem::size_of::<VertexPositionColor>() as u64
    );
    assert_eq!(
      VertexPositionTexture::LAYOUT.size_in_bytes(),
      std::mem::size_of::<VertexPositionTexture>() as u64
    );
  }

  #[test]
  fn test_layouts_are_valid() {
    assert!(VertexPositionColor::LAYOUT.validate().is_ok());
    assert!(VertexPositionTexture::LAYOUT.validate().is_ok());
    assert_ne!(VertexPositionColor::LAYOUT, VertexPositionTexture::LAYOUT);
  }
}
