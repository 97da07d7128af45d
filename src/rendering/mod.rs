pub mod clipper;
pub mod framebuffer;
/// Software rasterization pipeline
/// Scanline fill with perspective-correct attributes
pub mod rasterizer;
pub mod shading;
pub mod texture;

pub use clipper::{ClipOutcome, ClipPolygon, Clipper, EdgeAction, MAX_CLIP_VERTICES};
pub use framebuffer::{Framebuffer, RenderTarget};
pub use rasterizer::{draw_scanline, rasterize_triangle, TriangleShape};
pub use shading::{Fragment, FragmentShader, TextureShader, Uniform, VertexColorShader};
pub use texture::Texture;
