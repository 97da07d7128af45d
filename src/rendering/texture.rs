/// In-memory ARGB32 texture, consumed as a fragment uniform.
/// Decoding image files is left to the host; this only stores and samples texels.

#[derive(Clone, Debug)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    /// Row-major ARGB32 texels.
    pub texels: Vec<u32>,
}

impl Texture {
    /// Wrap existing texels. Returns `None` if the buffer does not hold
    /// exactly `width * height` texels or either dimension is zero.
    pub fn from_texels(width: usize, height: usize, texels: Vec<u32>) -> Option<Self> {
        if width == 0 || height == 0 || texels.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            texels,
        })
    }

    pub fn solid(width: usize, height: usize, color: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            texels: vec![color; width * height],
        }
    }

    /// Checkerboard of `cell`-sized squares, `c1` in the top-left cell.
    pub fn checkerboard(width: usize, height: usize, cell: usize, c1: u32, c2: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let cell = cell.max(1);
        let mut texels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                texels.push(if even { c1 } else { c2 });
            }
        }
        Self {
            width,
            height,
            texels,
        }
    }

    /// Nearest-texel sample with wrap addressing.
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> u32 {
        let tx = Self::wrap(u, self.width);
        let ty = Self::wrap(v, self.height);
        self.texels[ty * self.width + tx]
    }

    #[inline]
    fn wrap(coord: f32, size: usize) -> usize {
        if !coord.is_finite() {
            return 0;
        }
        let scaled = (coord - coord.floor()) * size as f32;
        // `coord - floor` can round up to exactly 1.0 for tiny negatives.
        (scaled as usize).min(size - 1)
    }

    #[inline]
    pub fn texel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.texels[y * self.width + x])
        } else {
            None
        }
    }
}
