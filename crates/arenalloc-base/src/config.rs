/// Default arena size used by the exported allocators.
pub const MEMORY_SIZE: usize = 1 << 20;

/// Default chunk size of the bitmap allocator.
pub const PAGE_SIZE: usize = 1 << 12;

pub const BITS_IN_BYTE: usize = 8;

/// Longest run a single bitmap allocation may span. One mask byte wide.
pub const MAX_RUN_CHUNKS: usize = BITS_IN_BYTE;

/// Bytes occupied by an inline block header of the split allocator.
pub const HEADER_SIZE: usize = core::mem::size_of::<u32>();

/// Largest block span a header can describe (31 bits).
pub const MAX_BLOCK_SIZE: usize = (1 << 31) - 1;

/// Sizing rules applied by both allocators.
///
/// `Legacy` keeps the historical off-by-one behaviour: a bitmap request
/// always takes `bytes / chunk + 1` chunks, even for exact multiples, and a
/// split request is only served by a free block strictly larger than the
/// required span. `Corrected` rounds up exactly and accepts an exact fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
  #[default]
  Corrected,
  Legacy,
}

impl Policy {
  /// Number of chunks of `chunk` bytes needed to hold `bytes`.
  pub const fn chunks_for(self, bytes: usize, chunk: usize) -> usize {
    match self {
      Policy::Corrected => bytes.div_ceil(chunk),
      Policy::Legacy => (bytes / chunk).saturating_add(1),
    }
  }

  /// Whether a free block spanning `block` bytes may serve a span of
  /// `required` bytes.
  pub const fn fits(self, block: usize, required: usize) -> bool {
    match self {
      Policy::Corrected => block >= required,
      Policy::Legacy => block > required,
    }
  }
}
