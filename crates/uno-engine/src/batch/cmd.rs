use crate::backend::ResourceId;

/// Byte range of one uniform block inside the frame's uniform arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformSpan {
    /// Offset of the block; always a multiple of the uniform stride.
    pub offset: u32,
    /// Logical block size (not the stride).
    pub size: u32,
}

/// One recorded draw.
///
/// Geometry is addressed in the frame's shared index buffer; indices are
/// already rebased onto the shared vertex buffer. `texture` is the backend id
/// captured at submit time, so destroying the handle afterwards does not
/// affect this command.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCmd {
    pub first_index: u32,
    pub index_count: u32,
    /// First vertex this command appended (for per-draw uploads).
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub uniforms: UniformSpan,
    pub texture: ResourceId,
}
