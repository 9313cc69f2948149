#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
  Allocated,
  Free,
}

/// A contiguous span of the arena as reported by a metadata walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
  state: RegionState,
  offset: usize,
  size: usize,
}

impl Region {
  pub const fn allocated(offset: usize, size: usize) -> Self {
    Self {
      state: RegionState::Allocated,
      offset,
      size,
    }
  }

  pub const fn free(offset: usize, size: usize) -> Self {
    Self {
      state: RegionState::Free,
      offset,
      size,
    }
  }

  #[inline(always)]
  pub const fn state(&self) -> RegionState {
    self.state
  }

  #[inline(always)]
  pub const fn offset(&self) -> usize {
    self.offset
  }

  #[inline(always)]
  pub const fn size(&self) -> usize {
    self.size
  }

  #[inline(always)]
  pub const fn end(&self) -> usize {
    self.offset + self.size
  }

  #[inline]
  pub const fn is_free(&self) -> bool {
    matches!(self.state, RegionState::Free)
  }
}
