use std::rc::Rc;

use log::{debug, info};
use vertex_store::{
  GraphicsBackend, VertexPositionColor, VertexRecord, VertexStorageBufferBuilder,
};

///
/// Pixel space of the window. Pixel positions use the window convention:
/// origin at the top-left corner, y growing downwards. `to_ndc` flips y so
/// that the result has y growing upwards.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
  pub width: f32,
  pub height: f32,
}

impl Default for Viewport {
  fn default() -> Self {
    Self {
      width: 1280.0,
      height: 768.0,
    }
  }
}

impl Viewport {
  ///
  /// Map a pixel position (origin top-left, y down) to normalized device
  /// coordinates (origin center, y up).
  ///
  pub fn to_ndc(&self, x: f32, y: f32) -> [f32; 2] {
    [x / self.width * 2.0 - 1.0, 1.0 - y / self.height * 2.0]
  }
}

/// A rectangle in pixels, `(x, y)` being its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl PixelRect {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// Corners clockwise from the top-left, in NDC.
  pub fn vertices(
    &self,
    viewport: &Viewport,
    color: [f32; 4],
  ) -> [VertexPositionColor; 4] {
    let left = self.x;
    let right = self.x + self.width;
    let top = self.y;
    let bottom = self.y + self.height;

    [
      VertexPositionColor::new(viewport.to_ndc(left, top), color),
      VertexPositionColor::new(viewport.to_ndc(right, top), color),
      VertexPositionColor::new(viewport.to_ndc(right, bottom), color),
      VertexPositionColor::new(viewport.to_ndc(left, bottom), color),
    ]
  }
}

pub fn run<B: GraphicsBackend>(
  backend: Rc<B>,
  viewport: Viewport,
  rect: PixelRect,
) -> anyhow::Result<Vec<VertexPositionColor>> {
  anyhow::ensure!(
    viewport.width > 0.0 && viewport.height > 0.0,
    "viewport must not be empty: {viewport:?}"
  );
  anyhow::ensure!(
    rect.width > 0.0 && rect.height > 0.0,
    "rectangle must not be empty: {rect:?}"
  );

  let vertices = rect.vertices(&viewport, [1.0, 0.5, 0.0, 1.0]);
  debug!("ch04-screen-space: {rect:?} -> {vertices:?}");

  let buffer = VertexStorageBufferBuilder::new(VertexPositionColor::LAYOUT)
    .capacity(vertices.len())
    .set_label("Screen Space Rect")
    .build(backend)?;

  let uploaded = buffer.scope(|buffer| {
    buffer.upload_all(&vertices)?;
    buffer.read_records::<VertexPositionColor>()
  })?;

  info!(
    "ch04-screen-space: {}x{} rect at ({}, {}) on a {}x{} viewport",
    rect.width, rect.height, rect.x, rect.y, viewport.width, viewport.height
  );

  Ok(uploaded)
}
