/// Fragment stage: per-attribute shaders that fold attribute values into
/// the fragment color. Kept separate from the rasterizer so shading models
/// can evolve independently of the scanline walk.
use std::any::Any;
use std::sync::Arc;

use glam::Vec4;

use super::texture::Texture;

/// Opaque resource handed to every shader (typically the bound texture).
pub type Uniform = Arc<dyn Any + Send + Sync>;

/// Per-pixel value produced between interpolation and the framebuffer write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub position: (i32, i32),
    /// Packed ARGB32.
    pub color: u32,
}

impl Fragment {
    #[inline]
    pub fn new(x: i32, y: i32, color: u32) -> Self {
        Self {
            position: (x, y),
            color,
        }
    }
}

/// Optional per-attribute fragment stage.
///
/// `attribute` holds the perspective-corrected attribute bytes (1..=4
/// native-endian `f32`s). The shader decides how to blend into `fragment.color`.
pub trait FragmentShader: Send + Sync {
    fn apply(&self, attribute: &[u8], uniform: Option<&Uniform>, fragment: &mut Fragment);

    fn name(&self) -> &'static str {
        "fragment shader"
    }
}

/// Decode up to four `f32` channels from attribute bytes.
#[inline]
pub fn read_channels(attribute: &[u8]) -> Vec4 {
    let mut c = [0.0f32; 4];
    for (dst, chunk) in c.iter_mut().zip(attribute.chunks_exact(4)) {
        *dst = bytemuck::pod_read_unaligned(chunk);
    }
    Vec4::from_array(c)
}

/// Pack normalized RGBA into ARGB32.
#[inline]
pub fn pack_argb(rgba: Vec4) -> u32 {
    let c = (rgba.clamp(Vec4::ZERO, Vec4::ONE) * 255.0 + Vec4::splat(0.5)).as_uvec4();
    (c.w << 24) | (c.x << 16) | (c.y << 8) | c.z
}

/// Unpack ARGB32 into normalized RGBA.
#[inline]
pub fn unpack_argb(color: u32) -> Vec4 {
    Vec4::new(
        ((color >> 16) & 0xFF) as f32,
        ((color >> 8) & 0xFF) as f32,
        (color & 0xFF) as f32,
        (color >> 24) as f32,
    ) / 255.0
}

/// Channel-wise multiply of two ARGB32 colors.
/// Uses 8.8 fixed point: `(a * (b + 1)) >> 8` keeps 255 * 255 at 255.
#[inline]
pub fn modulate(a: u32, b: u32) -> u32 {
    let mut out = 0u32;
    for shift in [0u32, 8, 16, 24] {
        let ca = (a >> shift) & 0xFF;
        let cb = (b >> shift) & 0xFF;
        out |= ((ca * (cb + 1)) >> 8) << shift;
    }
    out
}

/// Modulates the fragment by an RGB or RGBA vertex color in `[0, 1]`.
/// A three-channel color is treated as opaque.
#[derive(Copy, Clone, Debug, Default)]
pub struct VertexColorShader;

impl FragmentShader for VertexColorShader {
    fn apply(&self, attribute: &[u8], _uniform: Option<&Uniform>, fragment: &mut Fragment) {
        let mut rgba = read_channels(attribute);
        if attribute.len() < 16 {
            rgba.w = 1.0;
        }
        fragment.color = modulate(fragment.color, pack_argb(rgba));
    }

    fn name(&self) -> &'static str {
        "vertex color"
    }
}

/// Samples the bound `Texture` uniform at the attribute's UV and modulates
/// the fragment. Without a texture uniform the fragment is left unchanged.
#[derive(Copy, Clone, Debug, Default)]
pub struct TextureShader;

impl FragmentShader for TextureShader {
    fn apply(&self, attribute: &[u8], uniform: Option<&Uniform>, fragment: &mut Fragment) {
        let Some(texture) = uniform.and_then(|u| u.downcast_ref::<Texture>()) else {
            return;
        };
        let uv = read_channels(attribute);
        fragment.color = modulate(fragment.color, texture.sample(uv.x, uv.y));
    }

    fn name(&self) -> &'static str {
        "texture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(values: &[f32]) -> Vec<u8> {
        bytemuck::cast_slice(values).to_vec()
    }

    #[test]
    fn pack_and_unpack_agree() {
        assert_eq!(pack_argb(Vec4::new(1.0, 0.0, 0.0, 1.0)), 0xFFFF0000);
        assert_eq!(pack_argb(Vec4::new(0.0, 0.0, 1.0, 1.0)), 0xFF0000FF);
        assert_eq!(pack_argb(Vec4::new(2.0, -1.0, 0.5, 1.0)), 0xFFFF0080);
        let back = unpack_argb(0x80FF4000);
        let expected = Vec4::new(1.0, 64.0 / 255.0, 0.0, 128.0 / 255.0);
        assert!((back - expected).abs().max_element() < 1e-6);
    }

    #[test]
    fn modulate_by_white_is_identity() {
        for color in [0xFF123456, 0x00000000, 0x80FF00FF] {
            assert_eq!(modulate(color, 0xFFFFFFFF), color);
            assert_eq!(modulate(0xFFFFFFFF, color), color);
        }
        assert_eq!(modulate(0xFFFF0000, 0xFF00FF00), 0xFF000000);
    }

    #[test]
    fn vertex_color_shader_treats_rgb_as_opaque() {
        let mut fragment = Fragment::new(0, 0, 0xFFFFFFFF);
        VertexColorShader.apply(&bytes(&[0.0, 1.0, 0.0]), None, &mut fragment);
        assert_eq!(fragment.color, 0xFF00FF00);
    }

    #[test]
    fn texture_shader_needs_a_texture_uniform() {
        let mut fragment = Fragment::new(0, 0, 0xFFFFFFFF);
        let uv = bytes(&[0.1, 0.1]);
        TextureShader.apply(&uv, None, &mut fragment);
        assert_eq!(fragment.color, 0xFFFFFFFF);

        let not_a_texture: Uniform = Arc::new(7u32);
        TextureShader.apply(&uv, Some(&not_a_texture), &mut fragment);
        assert_eq!(fragment.color, 0xFFFFFFFF);

        let texture: Uniform = Arc::new(Texture::solid(2, 2, 0xFF0000FF));
        TextureShader.apply(&uv, Some(&texture), &mut fragment);
        assert_eq!(fragment.color, 0xFF0000FF);
    }
}
