/// Runtime vertex layout description.
/// A format is data, not a type: the pipeline reads every vertex through it,
/// so any mix of positions, colors, UVs and custom channels can be drawn.
use std::fmt;
use std::ops::{BitOr, Not};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::raw::MAX_VERTEX_BYTES;
use crate::rendering::shading::FragmentShader;

/// Upper bound on attributes in a single format.
pub const MAX_ATTRIBUTES: usize = 16;

/// Highest `Custom(n)` channel a format may declare.
/// Custom usages take bits 3..=31 of a `UsageMask`, one bit per channel.
pub const MAX_CUSTOM_CHANNEL: u8 = 28;

/// What an attribute means to the pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeUsage {
    Position,
    Color,
    Uv,
    Custom(u8),
}

/// How many `f32` components an attribute stores.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericKind {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
}

impl NumericKind {
    #[inline]
    pub const fn components(self) -> usize {
        match self {
            NumericKind::Scalar => 1,
            NumericKind::Vec2 => 2,
            NumericKind::Vec3 => 3,
            NumericKind::Vec4 => 4,
        }
    }

    #[inline]
    pub const fn byte_size(self) -> usize {
        self.components() * std::mem::size_of::<f32>()
    }
}

/// Set of attribute usages, used to exclude attributes from `VertexFormat::scale`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct UsageMask(u32);

impl UsageMask {
    pub const NONE: UsageMask = UsageMask(0);
    pub const POSITION: UsageMask = UsageMask(1 << 0);
    pub const COLOR: UsageMask = UsageMask(1 << 1);
    pub const UV: UsageMask = UsageMask(1 << 2);
    pub const ALL: UsageMask = UsageMask(u32::MAX);

    /// Mask containing exactly one usage.
    ///
    /// Channels past `MAX_CUSTOM_CHANNEL` have no bit: their mask is empty
    /// and no mask contains them. The builder refuses to declare them.
    #[inline]
    pub const fn of(usage: AttributeUsage) -> Self {
        match usage {
            AttributeUsage::Position => Self::POSITION,
            AttributeUsage::Color => Self::COLOR,
            AttributeUsage::Uv => Self::UV,
            AttributeUsage::Custom(n) if n > MAX_CUSTOM_CHANNEL => Self::NONE,
            AttributeUsage::Custom(n) => UsageMask(1 << (n as u32 + 3)),
        }
    }

    #[inline]
    pub const fn contains(self, usage: AttributeUsage) -> bool {
        self.0 & Self::of(usage).0 != 0
    }
}

impl BitOr for UsageMask {
    type Output = UsageMask;

    fn bitor(self, rhs: Self) -> Self {
        UsageMask(self.0 | rhs.0)
    }
}

impl Not for UsageMask {
    type Output = UsageMask;

    fn not(self) -> Self {
        UsageMask(!self.0)
    }
}

/// One typed slice of a vertex.
///
/// `stride` is the byte distance between consecutive vertices in a packed
/// vertex stream; all attributes of a well-formed format share it.
#[derive(Clone)]
pub struct Attribute {
    pub usage: AttributeUsage,
    pub kind: NumericKind,
    pub offset: usize,
    pub stride: usize,
    /// Optional per-attribute fragment stage.
    pub shader: Option<Arc<dyn FragmentShader>>,
}

impl Attribute {
    pub fn new(usage: AttributeUsage, kind: NumericKind, offset: usize, stride: usize) -> Self {
        Self {
            usage,
            kind,
            offset,
            stride,
            shader: None,
        }
    }

    pub fn with_shader(mut self, shader: Arc<dyn FragmentShader>) -> Self {
        self.shader = Some(shader);
        self
    }

    /// Byte range covered by this attribute inside a vertex.
    #[inline]
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.kind.byte_size()
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("usage", &self.usage)
            .field("kind", &self.kind)
            .field("offset", &self.offset)
            .field("stride", &self.stride)
            .field("shader", &self.shader.as_ref().map(|s| s.name()))
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("vertex format declares more than one position attribute")]
    DuplicatePosition,
    #[error("vertex stride of {stride} bytes exceeds the {max}-byte vertex limit")]
    StrideTooLarge { stride: usize, max: usize },
    #[error("vertex format declares {count} attributes, at most {max} are supported")]
    TooManyAttributes { count: usize, max: usize },
    #[error("custom channel {channel} is out of range, channels go up to {max}")]
    CustomChannelOutOfRange { channel: u8, max: u8 },
}

/// Ordered attribute list describing one vertex.
#[derive(Clone, Debug, Default)]
pub struct VertexFormat {
    attributes: Vec<Attribute>,
    stride: usize,
}

impl VertexFormat {
    /// Accept a layout exactly as given. Offsets are not checked; reads that
    /// fall outside a vertex yield zeros.
    pub fn new(attributes: Vec<Attribute>) -> Self {
        let stride = attributes
            .iter()
            .map(|a| a.stride.max(a.offset + a.kind.byte_size()))
            .max()
            .unwrap_or(0);
        Self { attributes, stride }
    }

    /// A format without attributes. Every extraction returns a zero vector.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> VertexFormatBuilder {
        VertexFormatBuilder::default()
    }

    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Total bytes per vertex.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// First attribute tagged `Position`, if any.
    #[inline]
    pub fn position_attribute(&self) -> Option<&Attribute> {
        self.find(AttributeUsage::Position)
    }

    pub fn find(&self, usage: AttributeUsage) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.usage == usage)
    }
}

/// Packs attributes tightly in declaration order.
#[derive(Default)]
pub struct VertexFormatBuilder {
    entries: Vec<(AttributeUsage, NumericKind, Option<Arc<dyn FragmentShader>>)>,
}

impl VertexFormatBuilder {
    pub fn attribute(mut self, usage: AttributeUsage, kind: NumericKind) -> Self {
        self.entries.push((usage, kind, None));
        self
    }

    pub fn shaded_attribute(
        mut self,
        usage: AttributeUsage,
        kind: NumericKind,
        shader: Arc<dyn FragmentShader>,
    ) -> Self {
        self.entries.push((usage, kind, Some(shader)));
        self
    }

    pub fn build(self) -> Result<VertexFormat, FormatError> {
        if self.entries.len() > MAX_ATTRIBUTES {
            return Err(FormatError::TooManyAttributes {
                count: self.entries.len(),
                max: MAX_ATTRIBUTES,
            });
        }

        for (usage, _, _) in &self.entries {
            if let AttributeUsage::Custom(channel) = *usage {
                if channel > MAX_CUSTOM_CHANNEL {
                    return Err(FormatError::CustomChannelOutOfRange {
                        channel,
                        max: MAX_CUSTOM_CHANNEL,
                    });
                }
            }
        }

        let positions = self
            .entries
            .iter()
            .filter(|(usage, _, _)| *usage == AttributeUsage::Position)
            .count();
        if positions > 1 {
            return Err(FormatError::DuplicatePosition);
        }

        let stride: usize = self.entries.iter().map(|(_, kind, _)| kind.byte_size()).sum();
        if stride > MAX_VERTEX_BYTES {
            return Err(FormatError::StrideTooLarge {
                stride,
                max: MAX_VERTEX_BYTES,
            });
        }

        let mut offset = 0;
        let mut attributes = Vec::with_capacity(self.entries.len());
        for (usage, kind, shader) in self.entries {
            attributes.push(Attribute {
                usage,
                kind,
                offset,
                stride,
                shader,
            });
            offset += kind.byte_size();
        }

        Ok(VertexFormat { attributes, stride })
    }
}
