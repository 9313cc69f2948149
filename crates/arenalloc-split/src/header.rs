use arenalloc_base::config::{
  HEADER_SIZE,
  MAX_BLOCK_SIZE,
};

const ALLOCATED_BIT: u32 = 1;
const SIZE_SHIFT: u32 = 1;

/// Inline block header: one allocation bit followed by a 31-bit span that
/// counts the header itself. Stored as a little-endian `u32` with the
/// allocation flag in bit 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  allocated: bool,
  size: usize,
}

impl Header {
  pub const fn new(allocated: bool, size: usize) -> Self {
    assert!(size <= MAX_BLOCK_SIZE, "block span does not fit in 31 bits");
    Self { allocated, size }
  }

  #[inline]
  pub const fn free(size: usize) -> Self {
    Self::new(false, size)
  }

  #[inline]
  pub const fn allocated(size: usize) -> Self {
    Self::new(true, size)
  }

  #[inline(always)]
  pub const fn is_allocated(&self) -> bool {
    self.allocated
  }

  #[inline(always)]
  pub const fn size(&self) -> usize {
    self.size
  }

  pub const fn encode(self) -> [u8; HEADER_SIZE] {
    let raw = ((self.size as u32) << SIZE_SHIFT) | (self.allocated as u32 * ALLOCATED_BIT);
    raw.to_le_bytes()
  }

  pub const fn decode(bytes: [u8; HEADER_SIZE]) -> Self {
    let raw = u32::from_le_bytes(bytes);
    Self {
      allocated: raw & ALLOCATED_BIT != 0,
      size: (raw >> SIZE_SHIFT) as usize,
    }
  }

  /// Header stored at `offset`, if the arena holds one there.
  pub fn read(arena: &[u8], offset: usize) -> Option<Self> {
    let bytes = arena.get(offset..)?.first_chunk::<HEADER_SIZE>()?;
    Some(Self::decode(*bytes))
  }

  pub fn write(self, arena: &mut [u8], offset: usize) {
    let Some(slot) = arena
      .get_mut(offset..)
      .and_then(|tail| tail.first_chunk_mut::<HEADER_SIZE>())
    else {
      panic!("block header at {} does not fit the arena", offset);
    };
    *slot = self.encode();
  }
}
