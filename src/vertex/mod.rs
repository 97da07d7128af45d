/// Runtime-described vertices: layout registry, stack storage and the
/// generic operations the clipper and rasterizer are built on.
pub mod format;
pub mod ops;
pub mod raw;

pub use format::{
    Attribute, AttributeUsage, FormatError, NumericKind, UsageMask, VertexFormat,
    VertexFormatBuilder, MAX_ATTRIBUTES, MAX_CUSTOM_CHANNEL,
};
pub use raw::{RawVertex, MAX_VERTEX_BYTES};
