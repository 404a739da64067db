use std::marker::PhantomData;

use bytemuck::Pod;

use crate::backend::{BatchSizes, ResourceId, Vertex};

use super::{DrawCmd, UniformSpan};

/// Rounds `size` up to a multiple of `alignment`.
#[inline]
pub fn align_up(size: u32, alignment: u32) -> u32 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// Per-frame draw batch.
///
/// Collects geometry, one uniform block of type `U` per draw and the resolved
/// texture id into shared arenas, so a frame uploads each buffer once.
///
/// Performance characteristics:
/// - `push()` is amortised O(vertices + indices)
/// - `clear()` truncates; arenas keep their high-water-mark capacity
///
/// Uniform blocks are laid out at `i * stride`, where `stride` is the block
/// size rounded up to the backend's uniform offset alignment.
#[derive(Debug)]
pub struct DrawList<U> {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    uniforms: Vec<u8>,
    cmds: Vec<DrawCmd>,
    uniform_stride: u32,
    _block: PhantomData<U>,
}

impl<U: Pod> DrawList<U> {
    /// Creates an empty list for a backend with the given uniform offset
    /// alignment.
    pub fn new(min_uniform_alignment: u32) -> Self {
        let block = std::mem::size_of::<U>().max(1) as u32;
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            uniforms: Vec::new(),
            cmds: Vec::new(),
            uniform_stride: align_up(block, min_uniform_alignment),
            _block: PhantomData,
        }
    }

    /// Drops all recorded draws. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.uniforms.clear();
        self.cmds.clear();
    }

    /// Appends one draw.
    ///
    /// `indices` are relative to `vertices` and are rebased onto the shared
    /// vertex buffer.
    pub fn push(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
        uniforms: &U,
        texture: ResourceId,
    ) {
        debug_assert!(
            indices.iter().all(|&i| (i as usize) < vertices.len()),
            "index out of range for submitted vertices"
        );

        let first_vertex = self.vertices.len() as u32;
        let first_index = self.indices.len() as u32;

        self.vertices.extend_from_slice(vertices);
        self.indices.extend(indices.iter().map(|&i| i + first_vertex));

        let offset = self.cmds.len() as u32 * self.uniform_stride;
        let block = bytemuck::bytes_of(uniforms);
        self.uniforms.resize((offset + self.uniform_stride) as usize, 0);
        self.uniforms[offset as usize..offset as usize + block.len()].copy_from_slice(block);

        self.cmds.push(DrawCmd {
            first_index,
            index_count: indices.len() as u32,
            first_vertex,
            vertex_count: vertices.len() as u32,
            uniforms: UniformSpan { offset, size: block.len() as u32 },
            texture,
        });
    }

    /// Recorded draws in submission order.
    #[inline]
    pub fn commands(&self) -> &[DrawCmd] {
        &self.cmds
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Packed uniform arena (`len() * uniform_stride()` bytes).
    #[inline]
    pub fn uniform_bytes(&self) -> &[u8] {
        &self.uniforms
    }

    #[inline]
    pub fn uniform_stride(&self) -> u32 {
        self.uniform_stride
    }

    /// Upload volume of the recorded frame.
    pub fn sizes(&self) -> BatchSizes {
        BatchSizes {
            vertices: self.vertices.len() as u32,
            indices: self.indices.len() as u32,
            uniform_bytes: self.uniforms.len() as u32,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::{Pod, Zeroable};

    use super::*;

    #[repr(C)]
    #[derive(Debug, Copy, Clone, Pod, Zeroable)]
    struct Block {
        value: [f32; 4],
    }

    fn quad() -> ([Vertex; 4], [u32; 6]) {
        ([Vertex::default(); 4], [0, 1, 2, 0, 2, 3])
    }

    // ── alignment ─────────────────────────────────────────────────────────

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(16, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(12, 0), 12);
    }

    #[test]
    fn stride_is_block_rounded_to_alignment() {
        assert_eq!(DrawList::<Block>::new(256).uniform_stride(), 256);
        assert_eq!(DrawList::<Block>::new(4).uniform_stride(), 16);
    }

    // ── push ──────────────────────────────────────────────────────────────

    #[test]
    fn indices_are_rebased_by_vertex_offset() {
        let mut list = DrawList::<Block>::new(256);
        let (v, i) = quad();
        list.push(&v, &i, &Block::zeroed(), 1);
        list.push(&v, &i, &Block::zeroed(), 1);

        assert_eq!(&list.indices()[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(list.commands()[1].first_index, 6);
        assert_eq!(list.commands()[1].first_vertex, 4);
        assert_eq!(list.vertices().len(), 8);
    }

    #[test]
    fn uniform_blocks_are_packed_at_stride() {
        let mut list = DrawList::<Block>::new(256);
        let (v, i) = quad();
        for n in 0..3 {
            list.push(&v, &i, &Block { value: [n as f32; 4] }, 0);
        }

        assert_eq!(list.uniform_bytes().len(), 3 * 256);
        for (n, cmd) in list.commands().iter().enumerate() {
            assert_eq!(cmd.uniforms, UniformSpan { offset: n as u32 * 256, size: 16 });
            let start = cmd.uniforms.offset as usize;
            let bytes = &list.uniform_bytes()[start..start + 16];
            let block: Block = bytemuck::pod_read_unaligned(bytes);
            assert_eq!(block.value, [n as f32; 4]);
        }
    }

    #[test]
    fn commands_keep_submission_order_and_texture() {
        let mut list = DrawList::<Block>::new(64);
        let (v, i) = quad();
        for tex in [3, 1, 2] {
            list.push(&v, &i, &Block::zeroed(), tex);
        }
        let textures: Vec<_> = list.commands().iter().map(|c| c.texture).collect();
        assert_eq!(textures, vec![3, 1, 2]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut list = DrawList::<Block>::new(256);
        let (v, i) = quad();
        list.push(&v, &i, &Block::zeroed(), 0);
        let cap = list.uniforms.capacity();

        list.clear();
        assert!(list.is_empty());
        assert!(list.vertices().is_empty());
        assert_eq!(list.uniforms.capacity(), cap);
        assert_eq!(list.sizes(), BatchSizes::default());
    }
}
