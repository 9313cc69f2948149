use arenalloc_base::prelude::*;
use arenalloc_bitmap::{
  Bitmap,
  BitmapError,
};
use log::{
  debug,
  trace,
};

#[derive(Debug, PartialEq)]
pub enum FixedError {
  ZeroSize,
  TooLarge { chunks: usize, limit: usize },
  OutOfMemory { chunks: usize },
  OutOfBounds { offset: usize, size: usize },
  Misaligned { offset: usize, chunk: usize },
  NotAllocated { chunk: usize },
  BitmapError(BitmapError),
}

impl FixedError {
  pub const fn kind(&self) -> FailureKind {
    match self {
      FixedError::OutOfMemory { .. } => FailureKind::OutOfMemory,
      FixedError::ZeroSize | FixedError::TooLarge { .. } | FixedError::BitmapError(_) => {
        FailureKind::InvalidRequest
      }
      FixedError::OutOfBounds { .. }
      | FixedError::Misaligned { .. }
      | FixedError::NotAllocated { .. } => FailureKind::InvalidAddress,
    }
  }
}

pub type FixedResult<T> = Result<T, FixedError>;

/// Bitmap chunk allocator over an inline arena of `MAP * 8` chunks of
/// `CHUNK` bytes each.
///
/// One bit per chunk marks it as part of a live allocation. A parallel
/// table holds, for the first chunk of every allocation, the length of its
/// run (1..=8); every other entry is 0.
pub struct Fixed<const CHUNK: usize, const MAP: usize> {
  arena: [[[u8; CHUNK]; BITS_IN_BYTE]; MAP],
  bitmap: [u8; MAP],
  runs: [[u8; BITS_IN_BYTE]; MAP],
  policy: Policy,
}

impl<const CHUNK: usize, const MAP: usize> Fixed<CHUNK, MAP> {
  pub const CHUNKS: usize = MAP * BITS_IN_BYTE;
  pub const SIZE: usize = Self::CHUNKS * CHUNK;

  pub const fn new() -> Self {
    Self::with_policy(Policy::Corrected)
  }

  pub const fn with_policy(policy: Policy) -> Self {
    const {
      assert!(CHUNK > 0, "chunk size must not be zero");
      assert!(MAP > 0, "bitmap must hold at least one byte");
    }

    Self {
      arena: [[[0; CHUNK]; BITS_IN_BYTE]; MAP],
      bitmap: [0; MAP],
      runs: [[0; BITS_IN_BYTE]; MAP],
      policy,
    }
  }

  #[inline(always)]
  pub const fn policy(&self) -> Policy {
    self.policy
  }

  #[inline(always)]
  pub const fn chunk_size(&self) -> usize {
    CHUNK
  }

  #[inline(always)]
  pub const fn bitmap_len(&self) -> usize {
    MAP
  }

  #[inline(always)]
  pub const fn runs_len(&self) -> usize {
    Self::CHUNKS
  }

  pub fn bitmap_byte(&self, index: usize) -> Option<u8> {
    self.bitmap.get(index).copied()
  }

  pub fn run_length(&self, chunk: usize) -> Option<u8> {
    self.runs().get(chunk).copied()
  }

  pub fn used_chunks(&self) -> usize {
    self.bitmap.iter().map(|byte| byte.count_ones() as usize).sum()
  }

  #[inline]
  fn runs(&self) -> &[u8] {
    self.runs.as_flattened()
  }

  #[inline]
  fn runs_mut(&mut self) -> &mut [u8] {
    self.runs.as_flattened_mut()
  }

  fn chunk_map(&mut self) -> FixedResult<Bitmap<'_>> {
    Bitmap::new(&mut self.bitmap, Self::CHUNKS).map_err(FixedError::BitmapError)
  }

  fn chunk_of(&self, addr: Addr) -> FixedResult<usize> {
    let offset = addr.offset();
    if offset >= Self::SIZE {
      return Err(FixedError::OutOfBounds {
        offset,
        size: Self::SIZE,
      });
    }
    if offset % CHUNK != 0 {
      return Err(FixedError::Misaligned {
        offset,
        chunk: CHUNK,
      });
    }
    Ok(offset / CHUNK)
  }

  fn live_run(&self, addr: Addr) -> FixedResult<(usize, usize)> {
    let chunk = self.chunk_of(addr)?;
    let run = self.runs()[chunk] as usize;
    if run == 0 || run > MAX_RUN_CHUNKS {
      return Err(FixedError::NotAllocated { chunk });
    }
    Ok((chunk, run))
  }
}

impl<const CHUNK: usize, const MAP: usize> Default for Fixed<CHUNK, MAP> {
  fn default() -> Self {
    Self::new()
  }
}

impl<const CHUNK: usize, const MAP: usize> ArenaAlloc for Fixed<CHUNK, MAP> {
  type Error = FixedError;

  fn init(&mut self) {
    self.arena_mut().fill(0);
    self.bitmap.fill(0);
    self.runs_mut().fill(0);
  }

  fn try_alloc(&mut self, bytes: usize) -> FixedResult<Addr> {
    if bytes == 0 {
      debug!("fixed: refusing zero-byte request");
      return Err(FixedError::ZeroSize);
    }

    let chunks = self.policy.chunks_for(bytes, CHUNK);
    if chunks > MAX_RUN_CHUNKS {
      debug!("fixed: {} bytes need {} chunks, limit is {}", bytes, chunks, MAX_RUN_CHUNKS);
      return Err(FixedError::TooLarge {
        chunks,
        limit: MAX_RUN_CHUNKS,
      });
    }

    let mut map = self.chunk_map()?;
    let Some(first) = map.find_clear_run(chunks) else {
      debug!("fixed: no run of {} free chunks", chunks);
      return Err(FixedError::OutOfMemory { chunks });
    };
    map.set_range(first, chunks).map_err(FixedError::BitmapError)?;

    // chunks <= MAX_RUN_CHUNKS, so it fits the table entry
    self.runs_mut()[first] = chunks as u8;

    let addr = Addr::new(first * CHUNK);
    trace!("fixed: alloc {} bytes -> {} ({} chunks)", bytes, addr, chunks);
    Ok(addr)
  }

  fn try_dealloc(&mut self, addr: Addr) -> FixedResult<()> {
    let (chunk, run) = self.live_run(addr).inspect_err(|err| {
      debug!("fixed: ignoring free of {}: {:?}", addr, err);
    })?;

    self.chunk_map()?.clear_range(chunk, run).map_err(FixedError::BitmapError)?;
    self.runs_mut()[chunk] = 0;

    trace!("fixed: dealloc {} ({} chunks)", addr, run);
    Ok(())
  }

  fn regions(&self) -> impl Iterator<Item = Region> {
    FixedRegions::new(self.runs(), CHUNK)
  }

  fn usable_size(&self, addr: Addr) -> Option<usize> {
    let (_, run) = self.live_run(addr).ok()?;
    Some(run * CHUNK)
  }

  #[inline]
  fn arena(&self) -> &[u8] {
    self.arena.as_flattened().as_flattened()
  }

  #[inline]
  fn arena_mut(&mut self) -> &mut [u8] {
    self.arena.as_flattened_mut().as_flattened_mut()
  }
}

/// Walks the run-length table: every non-zero entry is one allocated run,
/// every maximal stretch of zero entries between runs is one free region.
pub struct FixedRegions<'runs> {
  runs: &'runs [u8],
  chunk: usize,
  index: usize,
}

impl<'runs> FixedRegions<'runs> {
  pub const fn new(runs: &'runs [u8], chunk: usize) -> Self {
    Self {
      runs,
      chunk,
      index: 0,
    }
  }
}

impl Iterator for FixedRegions<'_> {
  type Item = Region;

  fn next(&mut self) -> Option<Region> {
    let start = self.index;
    let run = *self.runs.get(start)? as usize;

    if run != 0 {
      self.index = (start + run).min(self.runs.len());
      return Some(Region::allocated(
        start * self.chunk,
        (self.index - start) * self.chunk,
      ));
    }

    let free = self.runs[start..]
      .iter()
      .take_while(|entry| **entry == 0)
      .count();
    self.index = start + free;
    Some(Region::free(start * self.chunk, free * self.chunk))
  }
}
