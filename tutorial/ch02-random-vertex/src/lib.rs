use std::rc::Rc;

use log::{debug, info};
use rand::Rng;
use vertex_store::{
  GraphicsBackend, VertexPositionColor, VertexRecord,
  VertexStorageBufferBuilder,
};

const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// Triangle for one frame, with the top vertex moved to `top_x`.
pub fn triangle(top_x: f32) -> [VertexPositionColor; 3] {
  [
    VertexPositionColor::new([top_x, 0.5], RED),
    VertexPositionColor::new([0.5, -0.5], GREEN),
    VertexPositionColor::new([-0.5, -0.5], BLUE),
  ]
}

/// -1.00 ..= 0.99 in steps of 0.01.
pub fn random_x(rng: &mut impl Rng) -> f32 {
  rng.gen_range(-100..100) as f32 / 100.0
}

pub fn run<B: GraphicsBackend>(
  backend: Rc<B>,
  frames: usize,
) -> anyhow::Result<Vec<f32>> {
  run_with_rng(backend, frames, &mut rand::thread_rng())
}

///
/// Re-upload the triangle `frames` times into one streaming buffer and return
/// the top x coordinate read back after each frame.
///
pub fn run_with_rng<B: GraphicsBackend>(
  backend: Rc<B>,
  frames: usize,
  rng: &mut impl Rng,
) -> anyhow::Result<Vec<f32>> {
  anyhow::ensure!(frames > 0, "at least one frame is required");

  // フレームごとに作り直さず、同じバッファを上書きし続ける
  let buffer = VertexStorageBufferBuilder::new(VertexPositionColor::LAYOUT)
    .capacity(3)
    .streaming()
    .set_label("Random Vertex Buffer")
    .build(backend)?;

  let top_xs = buffer.scope(|buffer| {
    let mut top_xs = Vec::with_capacity(frames);

    for frame in 0..frames {
      buffer.upload_all(&triangle(random_x(rng)))?;

      let vertices = buffer.read_records::<VertexPositionColor>()?;
      let top_x = vertices[0].position[0];
      debug!("ch02-random-vertex: frame {frame}, top x = {top_x}");

      top_xs.push(top_x);
    }

    Ok::<_, anyhow::Error>(top_xs)
  })?;

  info!("ch02-random-vertex: rendered {frames} frames");
  Ok(top_xs)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::StdRng, SeedableRng};
  use vertex_store::HostBackend;

  #[test]
  fn test_top_vertex_follows_rng() {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = Rc::new(HostBackend::new());

    let top_xs =
      run_with_rng(Rc::clone(&backend), 8, &mut StdRng::seed_from_u64(7))
        .unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let expected: Vec<f32> = (0..8).map(|_| random_x(&mut rng)).collect();
    assert_eq!(top_xs, expected);
    assert!(top_xs.iter().all(|x| (-1.0..=0.99).contains(x)));
    assert_eq!(backend.live_buffers(), 0);
  }

  #[test]
  fn test_zero_frames_is_rejected() {
    let backend = Rc::new(HostBackend::new());
    assert!(run(Rc::clone(&backend), 0).is_err());
    assert_eq!(backend.live_buffers(), 0);
  }
}
