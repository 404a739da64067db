/// Small opaque slot handle issued by [`HandleRegistry`].
///
/// `u8::MAX` is reserved as the invalid sentinel, so a registry holds at most
/// 255 live handles.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u8);

impl Handle {
    /// Sentinel returned when allocation fails; never issued as a live handle.
    pub const INVALID: Self = Self(u8::MAX);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u8::MAX
    }
}

/// Fixed-capacity dense/sparse handle allocator.
///
/// - `dense[..len]` holds the live handles (order changes on release)
/// - `sparse[h]` is the position of `h` inside `dense`
///
/// Both `allocate()` and `release()` are O(1). Released handles are parked
/// right after the live range, so the most recently released handle is the
/// next one handed out.
///
/// Handles carry no generation; [`super::ResourceTable`] layers generations on
/// top of the slots it owns.
#[derive(Debug, Clone)]
pub struct HandleRegistry {
    len: u8,
    dense: Box<[u8]>,
    sparse: Box<[u8]>,
}

impl HandleRegistry {
    /// Creates an empty registry with room for `max_handles` live handles.
    ///
    /// # Panics
    /// Panics if `max_handles` is zero.
    pub fn new(max_handles: u8) -> Self {
        assert!(max_handles > 0, "max_handles must be greater than 0");
        let capacity = max_handles as usize;
        let mut registry = Self {
            len: 0,
            dense: vec![0; capacity].into_boxed_slice(),
            sparse: vec![u8::MAX; capacity].into_boxed_slice(),
        };
        registry.reset();
        registry
    }

    /// Returns the registry to its freshly constructed state.
    ///
    /// Every handle issued before the reset becomes dangling; only use this at
    /// teardown or full reinitialisation.
    pub fn reset(&mut self) {
        self.len = 0;
        for (i, slot) in self.dense.iter_mut().enumerate() {
            *slot = i as u8;
        }
        self.sparse.fill(u8::MAX);
    }

    /// Issues the next free handle, or [`Handle::INVALID`] when full.
    #[inline]
    pub fn allocate(&mut self) -> Handle {
        if self.is_full() {
            return Handle::INVALID;
        }

        let index = self.len;
        self.len += 1;

        let handle = self.dense[index as usize];
        self.sparse[handle as usize] = index;
        Handle(handle)
    }

    /// Returns `handle` to the free set.
    ///
    /// The sentinel is ignored. Releasing a handle that is not live is a caller
    /// bug; debug builds assert on it.
    pub fn release(&mut self, handle: Handle) {
        if !handle.is_valid() {
            return;
        }
        debug_assert!(self.contains(handle), "releasing a handle that is not live: {handle:?}");
        if self.len == 0 {
            return;
        }

        let top = self.len - 1;
        let index = self.sparse[handle.index()];

        // Move the last live handle into the hole, park the released one at `top`.
        let moved = self.dense[top as usize];
        self.dense[index as usize] = moved;
        self.sparse[moved as usize] = index;

        self.dense[top as usize] = handle.0;
        self.sparse[handle.index()] = top;

        self.len -= 1;
    }

    /// Returns true if `handle` is currently allocated.
    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        let Some(&index) = self.sparse.get(handle.index()) else {
            return false;
        };
        index < self.len && self.dense[index as usize] == handle.0
    }

    /// Number of live handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len as usize == self.dense.len()
    }

    /// Maximum number of simultaneously live handles.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.dense.len()
    }

    /// Iterates live handles in dense order (not allocation order).
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.dense[..self.len()].iter().map(|&h| Handle(h))
    }
}
