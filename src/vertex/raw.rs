/// Fixed-capacity vertex storage.
/// Vertices live on the stack; their bytes are only meaningful through a `VertexFormat`.

/// Largest vertex the pipeline can carry (16 `f32` components).
pub const MAX_VERTEX_BYTES: usize = 64;

#[derive(Copy, Clone, PartialEq)]
pub struct RawVertex {
    bytes: [u8; MAX_VERTEX_BYTES],
    len: usize,
}

impl RawVertex {
    /// A zero-filled vertex of `len` bytes (clamped to `MAX_VERTEX_BYTES`).
    #[inline]
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: [0; MAX_VERTEX_BYTES],
            len: len.min(MAX_VERTEX_BYTES),
        }
    }

    /// Copy a vertex out of caller-owned memory. Bytes beyond
    /// `MAX_VERTEX_BYTES` are dropped.
    #[inline]
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut vertex = Self::zeroed(data.len());
        vertex.bytes[..vertex.len].copy_from_slice(&data[..vertex.len]);
        vertex
    }

    /// Build a vertex from `f32` components laid out back to back.
    pub fn from_floats(values: &[f32]) -> Self {
        Self::from_bytes(bytemuck::cast_slice(values))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.len]
    }

    /// Read the `f32` at `offset`, or 0.0 if it lies past the vertex.
    #[inline]
    pub fn read_f32(&self, offset: usize) -> f32 {
        match self.as_bytes().get(offset..offset + 4) {
            Some(slice) => bytemuck::pod_read_unaligned(slice),
            None => 0.0,
        }
    }

    /// Write an `f32` at `offset`. Writes past the vertex are dropped.
    #[inline]
    pub fn write_f32(&mut self, offset: usize, value: f32) {
        if let Some(slice) = self.as_bytes_mut().get_mut(offset..offset + 4) {
            slice.copy_from_slice(bytemuck::bytes_of(&value));
        }
    }
}

impl std::fmt::Debug for RawVertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawVertex")
            .field("len", &self.len)
            .field("bytes", &self.as_bytes())
            .finish()
    }
}
