use bytemuck::{Pod, Zeroable};

/// Backend-side resource identifier (texture object).
pub type ResourceId = u32;

/// Id that never names a real resource. Binding it selects the backend's
/// default (white) texture.
pub const NO_RESOURCE: ResourceId = 0;

/// Framebuffer size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Texture binding target within a texture unit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum TextureTarget {
    #[default]
    D2,
    D2Array,
}

/// Source description for a texture: tightly packed RGBA8 rows.
#[derive(Debug, Copy, Clone)]
pub struct TextureDesc<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

impl<'a> TextureDesc<'a> {
    #[inline]
    pub const fn rgba8(width: u32, height: u32, pixels: &'a [u8]) -> Self {
        Self { width, height, pixels }
    }

    /// Byte length `pixels` must have.
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Vertex layout shared by every draw (32 bytes):
///
///  offset  0  pos    [f32; 2]   loc 0
///  offset  8  uv     [f32; 2]   loc 1
///  offset 16  color  [f32; 4]   loc 2
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    #[inline]
    pub const fn new(pos: [f32; 2], uv: [f32; 2], color: [f32; 4]) -> Self {
        Self { pos, uv, color }
    }
}

/// Per-draw uniform block. Positions are transformed as `pos * scale + translate`
/// and the vertex color is multiplied by `tint`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub translate: [f32; 2],
    pub scale: [f32; 2],
    pub tint: [f32; 4],
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self {
            translate: [0.0, 0.0],
            scale: [1.0, 1.0],
            tint: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Upload volume of one frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BatchSizes {
    pub vertices: u32,
    pub indices: u32,
    pub uniform_bytes: u32,
}
