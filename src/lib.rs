pub mod camera;
pub mod perf;
pub mod pipeline;
/// softraster - software 3D pipeline
/// Runtime vertex layouts, frustum clipping and perspective-correct scanline fill
pub mod rendering;
pub mod vertex;

pub use camera::{Camera, Frustum, FrustumPlane, Plane};
pub use perf::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};
pub use pipeline::{DrawStats, Pipeline, PipelineState, RasterConfig};
pub use rendering::{
    ClipOutcome, ClipPolygon, Clipper, Fragment, FragmentShader, Framebuffer, RenderTarget,
    Texture, TextureShader, Uniform, VertexColorShader,
};
pub use vertex::{
    Attribute, AttributeUsage, FormatError, NumericKind, RawVertex, UsageMask, VertexFormat,
    VertexFormatBuilder,
};
