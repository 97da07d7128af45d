/// Render targets for software rendering.
///
/// `RenderTarget` is a non-owning view over caller-owned pixel memory; the
/// pipeline holds one between draw calls. `Framebuffer` owns its pixels and
/// lends a `RenderTarget` for convenience.
use crate::count_call;
use crate::perf::FUNCTION_COUNTERS;

/// Mutable view over `width * height` ARGB32 pixels, row-major.
#[derive(Debug)]
pub struct RenderTarget<'a> {
    width: usize,
    height: usize,
    pixels: &'a mut [u32],
}

impl<'a> RenderTarget<'a> {
    /// Wrap `pixels`. Returns `None` if the slice is smaller than `width * height`.
    pub fn new(width: usize, height: usize, pixels: &'a mut [u32]) -> Option<Self> {
        let len = width.checked_mul(height)?;
        if pixels.len() < len {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: &mut pixels[..len],
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &*self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut *self.pixels
    }

    /// Pixel at (x, y), or `None` outside the target.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Bounds-checked write. Returns false when (x, y) is outside the target.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.pixels[y * self.width + x] = color;
        true
    }

    /// Mutable access to one full row.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [u32]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&mut self.pixels[start..start + self.width])
    }

    pub fn clear(&mut self, color: u32) {
        count_call!(FUNCTION_COUNTERS.target_clear_calls);
        self.pixels.fill(color);
    }
}

/// Owning pixel buffer.
pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    pub color_buffer: Vec<u32>, // ARGB format
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color_buffer: vec![0; width * height],
        }
    }

    pub fn clear(&mut self, clear_color: u32) {
        count_call!(FUNCTION_COUNTERS.target_clear_calls);
        self.color_buffer.fill(clear_color);
    }

    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.color_buffer[y * self.width + x])
        } else {
            None
        }
    }

    /// Borrow the pixels as a render target.
    pub fn as_target(&mut self) -> RenderTarget<'_> {
        RenderTarget {
            width: self.width,
            height: self.height,
            pixels: &mut self.color_buffer[..],
        }
    }

    /// Number of pixels that differ from `clear_color`.
    pub fn count_not(&self, clear_color: u32) -> usize {
        self.color_buffer.iter().filter(|&&c| c != clear_color).count()
    }
}
