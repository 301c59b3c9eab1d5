use std::rc::Rc;

use clap::{Parser, ValueEnum};
use log::info;
use vertex_store::{
  GraphicsBackend, HostBackend, WgpuBackend, WgpuBackendOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
  /// Keep buffers in host memory
  Host,
  /// Use a headless wgpu device
  Wgpu,
}

/// Run one vertex buffer practice scenario.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
  /// Workspace member to run, e.g. tutorial/ch01-triangle
  target: String,

  #[arg(long, value_enum, default_value_t = Backend::Host)]
  backend: Backend,

  /// Request a software adapter (wgpu backend only)
  #[arg(long)]
  fallback_adapter: bool,

  /// Frames to stream (tutorial/ch02-random-vertex)
  #[arg(long, default_value_t = 3)]
  frames: usize,
}

fn main() -> anyhow::Result<()> {
  env_logger::init();

  let args = Args::parse();

  match args.backend {
    Backend::Host => run_target(Rc::new(HostBackend::new()), &args),
    Backend::Wgpu => {
      let options = WgpuBackendOptions {
        force_fallback_adapter: args.fallback_adapter,
        ..Default::default()
      };
      let backend = pollster::block_on(WgpuBackend::headless(options))?;
      run_target(Rc::new(backend), &args)
    }
  }
}

fn run_target<B: GraphicsBackend>(
  backend: Rc<B>,
  args: &Args,
) -> anyhow::Result<()> {
  info!("Running {} on the {} backend", args.target, backend.name());

  match args.target.as_str() {
    "tutorial/ch01-triangle" => {
      for vertex in ch01_triangle::run(backend)? {
        println!("{:?}", vertex.position);
      }
    }
    "tutorial/ch02-random-vertex" => {
      let top_xs = ch02_random_vertex::run(backend, args.frames)?;
      for (frame, x) in top_xs.iter().enumerate() {
        println!("frame {frame}: top x = {x:.2}");
      }
    }
    "tutorial/ch03-vertex-color" => {
      let quad = ch03_vertex_color::run(backend)?;
      for vertex in &quad.vertices {
        println!("{:?} {:?}", vertex.position, vertex.color);
      }
      println!("indices: {:?}", quad.indices);
    }
    "tutorial/ch04-screen-space" => {
      let viewport = ch04_screen_space::Viewport::default();
      let rect = ch04_screen_space::PixelRect::new(100.0, 100.0, 400.0, 200.0);
      for vertex in ch04_screen_space::run(backend, viewport, rect)? {
        println!("{:?}", vertex.position);
      }
    }
    _ => println!("Not found: {}", args.target),
  }

  Ok(())
}
