/// Format-driven vertex operations.
/// Every routine walks the attribute list and treats each attribute as
/// 1..=4 independent `f32` channels.
use glam::Vec4;

use super::format::{Attribute, AttributeUsage, UsageMask, VertexFormat};
use super::raw::RawVertex;
use crate::rendering::shading::{Fragment, Uniform};

#[inline]
fn read_components(vertex: &RawVertex, attribute: &Attribute) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (i, c) in out.iter_mut().enumerate().take(attribute.kind.components()) {
        *c = vertex.read_f32(attribute.offset + i * 4);
    }
    out
}

#[inline]
fn write_components(vertex: &mut RawVertex, attribute: &Attribute, values: [f32; 4]) {
    for (i, c) in values.iter().enumerate().take(attribute.kind.components()) {
        vertex.write_f32(attribute.offset + i * 4, *c);
    }
}

impl VertexFormat {
    /// Position as a 4-vector. Missing components read as 0 with `w = 1`;
    /// a format without a position attribute yields `Vec4::ZERO`.
    pub fn get_position(&self, vertex: &RawVertex) -> Vec4 {
        let Some(attribute) = self.position_attribute() else {
            return Vec4::ZERO;
        };

        let mut c = read_components(vertex, attribute);
        if attribute.kind.components() < 4 {
            c[3] = 1.0;
        }
        Vec4::from_array(c)
    }

    /// Store as many position components as the attribute holds.
    pub fn set_position(&self, vertex: &mut RawVertex, position: Vec4) {
        if let Some(attribute) = self.position_attribute() {
            write_components(vertex, attribute, position.to_array());
        }
    }

    /// Linear interpolation of every attribute. `t` is not clamped.
    pub fn interpolate(&self, a: &RawVertex, b: &RawVertex, t: f32) -> RawVertex {
        let mut out = *a;
        for attribute in self.attributes() {
            let ca = read_components(a, attribute);
            let cb = read_components(b, attribute);
            // Weighted form keeps both endpoints exact.
            let mut mixed = [0.0; 4];
            for i in 0..attribute.kind.components() {
                mixed[i] = ca[i] * (1.0 - t) + cb[i] * t;
            }
            write_components(&mut out, attribute, mixed);
        }
        out
    }

    /// Multiply every attribute whose usage is not in `exclude` by `scalar`.
    pub fn scale(&self, vertex: &RawVertex, scalar: f32, exclude: UsageMask) -> RawVertex {
        let mut out = *vertex;
        for attribute in self.attributes() {
            if exclude.contains(attribute.usage) {
                continue;
            }
            let mut c = read_components(vertex, attribute);
            for value in c.iter_mut().take(attribute.kind.components()) {
                *value *= scalar;
            }
            write_components(&mut out, attribute, c);
        }
        out
    }

    /// Run each attribute's fragment shader, in layout order.
    pub fn apply_fragment(
        &self,
        vertex: &RawVertex,
        uniform: Option<&Uniform>,
        fragment: &mut Fragment,
    ) {
        let bytes = vertex.as_bytes();
        for attribute in self.attributes() {
            let Some(shader) = attribute.shader.as_deref() else {
                continue;
            };
            // Attributes hanging off the end of the vertex are not shaded.
            if let Some(slice) = bytes.get(attribute.byte_range()) {
                shader.apply(slice, uniform, fragment);
            }
        }
    }

    /// Read a non-position attribute as a 4-vector (unused lanes are 0).
    pub fn get_attribute(&self, vertex: &RawVertex, usage: AttributeUsage) -> Vec4 {
        self.find(usage)
            .map(|attribute| Vec4::from_array(read_components(vertex, attribute)))
            .unwrap_or(Vec4::ZERO)
    }

    /// Write an attribute's components; no-op if the format lacks `usage`.
    pub fn set_attribute(&self, vertex: &mut RawVertex, usage: AttributeUsage, value: Vec4) {
        if let Some(attribute) = self.find(usage) {
            write_components(vertex, attribute, value.to_array());
        }
    }

    /// A zeroed vertex sized for this format.
    #[inline]
    pub fn new_vertex(&self) -> RawVertex {
        RawVertex::zeroed(self.stride())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::format::NumericKind;
    use glam::vec4;

    fn pos_color_uv() -> VertexFormat {
        VertexFormat::builder()
            .attribute(AttributeUsage::Position, NumericKind::Vec3)
            .attribute(AttributeUsage::Color, NumericKind::Vec4)
            .attribute(AttributeUsage::Uv, NumericKind::Vec2)
            .build()
            .unwrap()
    }

    #[test]
    fn position_round_trip() {
        let format = VertexFormat::builder()
            .attribute(AttributeUsage::Uv, NumericKind::Vec2)
            .attribute(AttributeUsage::Position, NumericKind::Vec4)
            .build()
            .unwrap();
        let mut v = format.new_vertex();
        let p = vec4(1.5, -2.0, 3.25, 0.5);
        format.set_position(&mut v, p);
        assert_eq!(format.get_position(&v), p);
        // The UV in front of it is untouched.
        assert_eq!(format.get_attribute(&v, AttributeUsage::Uv), Vec4::ZERO);
    }

    #[test]
    fn three_component_position_reads_back_with_unit_w() {
        let format = pos_color_uv();
        let mut v = format.new_vertex();
        format.set_position(&mut v, vec4(4.0, 5.0, 6.0, 9.0));
        assert_eq!(format.get_position(&v), vec4(4.0, 5.0, 6.0, 1.0));
    }

    #[test]
    fn missing_position_is_zero_and_writes_are_ignored() {
        let format = VertexFormat::builder()
            .attribute(AttributeUsage::Color, NumericKind::Vec4)
            .build()
            .unwrap();
        let mut v = RawVertex::from_floats(&[0.1, 0.2, 0.3, 0.4]);
        let before = v;
        format.set_position(&mut v, vec4(1.0, 1.0, 1.0, 1.0));
        assert_eq!(v, before);
        assert_eq!(format.get_position(&v), Vec4::ZERO);

        let empty = VertexFormat::empty();
        assert_eq!(empty.get_position(&v), Vec4::ZERO);
        assert_eq!(empty.get_attribute(&v, AttributeUsage::Color), Vec4::ZERO);
    }

    #[test]
    fn interpolate_endpoints_and_midpoint() {
        let format = pos_color_uv();
        let a = RawVertex::from_floats(&[0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let b = RawVertex::from_floats(&[2.0, 4.0, 3.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0]);

        assert_eq!(format.interpolate(&a, &b, 0.0), a);
        assert_eq!(format.interpolate(&a, &b, 1.0), b);

        let mid = format.interpolate(&a, &b, 0.5);
        assert_eq!(format.get_position(&mid), vec4(1.0, 2.0, 2.0, 1.0));
        assert_eq!(
            format.get_attribute(&mid, AttributeUsage::Color),
            vec4(0.5, 0.5, 0.0, 1.0)
        );
        assert_eq!(
            format.get_attribute(&mid, AttributeUsage::Uv),
            vec4(0.5, 0.5, 0.0, 0.0)
        );
    }

    #[test]
    fn interpolate_does_not_clamp() {
        let format = pos_color_uv();
        let a = format.new_vertex();
        let mut b = format.new_vertex();
        format.set_attribute(&mut b, AttributeUsage::Uv, vec4(1.0, 2.0, 0.0, 0.0));
        let over = format.interpolate(&a, &b, 1.5);
        assert_eq!(
            format.get_attribute(&over, AttributeUsage::Uv),
            vec4(1.5, 3.0, 0.0, 0.0)
        );
    }

    #[test]
    fn scale_respects_exclusion_mask() {
        let format = pos_color_uv();
        let v = RawVertex::from_floats(&[1.0, 2.0, 3.0, 0.5, 0.5, 0.5, 1.0, 0.25, 0.75]);

        let attrs_only = format.scale(&v, 2.0, UsageMask::POSITION);
        assert_eq!(format.get_position(&attrs_only), vec4(1.0, 2.0, 3.0, 1.0));
        assert_eq!(
            format.get_attribute(&attrs_only, AttributeUsage::Color),
            vec4(1.0, 1.0, 1.0, 2.0)
        );
        assert_eq!(
            format.get_attribute(&attrs_only, AttributeUsage::Uv),
            vec4(0.5, 1.5, 0.0, 0.0)
        );

        let position_only = format.scale(&v, 2.0, !UsageMask::POSITION);
        assert_eq!(format.get_position(&position_only), vec4(2.0, 4.0, 6.0, 1.0));
        assert_eq!(
            format.get_attribute(&position_only, AttributeUsage::Color),
            vec4(0.5, 0.5, 0.5, 1.0)
        );
    }
}
