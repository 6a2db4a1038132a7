pub mod blit;

pub use blit::CanvasBlitter;
