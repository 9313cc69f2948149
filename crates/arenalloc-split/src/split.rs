use arenalloc_base::prelude::*;
use log::{
  debug,
  trace,
};

use crate::header::Header;

#[derive(Debug, PartialEq)]
pub enum SplitError {
  ZeroSize,
  TooLarge { bytes: usize, limit: usize },
  OutOfMemory { required: usize },
  InvalidAddress { offset: usize },
  DoubleFree { offset: usize },
}

impl SplitError {
  pub const fn kind(&self) -> FailureKind {
    match self {
      SplitError::OutOfMemory { .. } => FailureKind::OutOfMemory,
      SplitError::ZeroSize | SplitError::TooLarge { .. } => FailureKind::InvalidRequest,
      SplitError::InvalidAddress { .. } | SplitError::DoubleFree { .. } => {
        FailureKind::InvalidAddress
      }
    }
  }
}

pub type SplitResult<T> = Result<T, SplitError>;

/// First-fit allocator over an inline arena of `SIZE` bytes.
///
/// The arena is a chain of blocks, each starting with a [`Header`]. The
/// block at offset 0 is the head and every block is followed by the next
/// one at `offset + size`. Spans always add up to `SIZE` and no two free
/// blocks are ever adjacent once a call returns.
pub struct Split<const SIZE: usize> {
  arena: [u8; SIZE],
  policy: Policy,
}

impl<const SIZE: usize> Split<SIZE> {
  pub const LIMIT: usize = SIZE - HEADER_SIZE;

  pub const fn new() -> Self {
    Self::with_policy(Policy::Corrected)
  }

  pub const fn with_policy(policy: Policy) -> Self {
    const {
      assert!(SIZE > HEADER_SIZE, "arena must hold a header and a payload");
      assert!(SIZE <= MAX_BLOCK_SIZE, "arena span does not fit in a header");
    }

    let mut arena = [0; SIZE];
    let head = Header::free(SIZE).encode();
    let mut i = 0;
    while i < HEADER_SIZE {
      arena[i] = head[i];
      i += 1;
    }

    Self { arena, policy }
  }

  #[inline(always)]
  pub const fn policy(&self) -> Policy {
    self.policy
  }

  /// Walks the header chain from the head.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks::new(&self.arena)
  }

  /// Decodes whatever header bytes sit at `offset`.
  pub fn header_at(&self, offset: usize) -> Option<Header> {
    Header::read(&self.arena, offset)
  }

  fn find_block(&self, addr: Addr) -> SplitResult<(usize, Header)> {
    let invalid = SplitError::InvalidAddress {
      offset: addr.offset(),
    };
    let Some(start) = addr.checked_sub(HEADER_SIZE) else {
      return Err(invalid);
    };

    self
      .blocks()
      .take_while(|(offset, _)| *offset <= start.offset())
      .find(|(offset, _)| *offset == start.offset())
      .ok_or(invalid)
  }

  /// Merges every free block with its free successors.
  fn merge_pass(&mut self) -> usize {
    let mut merges = 0;
    let mut offset = 0;

    while offset < SIZE {
      let Some(current) = Header::read(&self.arena, offset) else {
        break;
      };
      let next = offset + current.size();
      if next >= SIZE {
        break;
      }

      match Header::read(&self.arena, next) {
        Some(successor) if !current.is_allocated() && !successor.is_allocated() => {
          Header::free(current.size() + successor.size()).write(&mut self.arena, offset);
          merges += 1;
        }
        _ => offset = next,
      }
    }

    merges
  }

  fn coalesce(&mut self) {
    let mut total = 0;
    loop {
      let merges = self.merge_pass();
      if merges == 0 {
        break;
      }
      total += merges;
    }
    trace!("split: coalesced {} blocks", total);
  }
}

impl<const SIZE: usize> Default for Split<SIZE> {
  fn default() -> Self {
    Self::new()
  }
}

impl<const SIZE: usize> ArenaAlloc for Split<SIZE> {
  type Error = SplitError;

  fn init(&mut self) {
    self.arena.fill(0);
    Header::free(SIZE).write(&mut self.arena, 0);
  }

  fn try_alloc(&mut self, bytes: usize) -> SplitResult<Addr> {
    if bytes == 0 {
      debug!("split: refusing zero-byte request");
      return Err(SplitError::ZeroSize);
    }
    if bytes > Self::LIMIT {
      debug!("split: {} bytes exceed limit {}", bytes, Self::LIMIT);
      return Err(SplitError::TooLarge {
        bytes,
        limit: Self::LIMIT,
      });
    }

    let required = bytes + HEADER_SIZE;
    let policy = self.policy;
    let Some((offset, block)) = self
      .blocks()
      .find(|(_, header)| !header.is_allocated() && policy.fits(header.size(), required))
    else {
      debug!("split: no free block for {} bytes", required);
      return Err(SplitError::OutOfMemory { required });
    };

    let remainder = block.size() - required;
    if remainder < HEADER_SIZE {
      // too small to carry a header of its own
      Header::allocated(block.size()).write(&mut self.arena, offset);
    } else {
      Header::allocated(required).write(&mut self.arena, offset);
      Header::free(remainder).write(&mut self.arena, offset + required);
    }

    let addr = Addr::new(offset + HEADER_SIZE);
    trace!("split: alloc {} bytes -> {} (block {})", bytes, addr, block.size());
    Ok(addr)
  }

  fn try_dealloc(&mut self, addr: Addr) -> SplitResult<()> {
    let (offset, block) = self.find_block(addr).inspect_err(|err| {
      debug!("split: ignoring free of {}: {:?}", addr, err);
    })?;

    if !block.is_allocated() {
      debug!("split: block at {} is already free", offset);
      return Err(SplitError::DoubleFree {
        offset: addr.offset(),
      });
    }

    Header::free(block.size()).write(&mut self.arena, offset);
    trace!("split: dealloc {} (block {})", addr, block.size());
    self.coalesce();
    Ok(())
  }

  fn regions(&self) -> impl Iterator<Item = Region> {
    self.blocks().map(|(offset, header)| {
      if header.is_allocated() {
        Region::allocated(offset, header.size())
      } else {
        Region::free(offset, header.size())
      }
    })
  }

  fn usable_size(&self, addr: Addr) -> Option<usize> {
    match self.find_block(addr) {
      Ok((_, block)) if block.is_allocated() => Some(block.size() - HEADER_SIZE),
      _ => None,
    }
  }

  #[inline]
  fn arena(&self) -> &[u8] {
    &self.arena
  }

  #[inline]
  fn arena_mut(&mut self) -> &mut [u8] {
    &mut self.arena
  }
}

/// Iterator over `(offset, header)` pairs of a block chain.
///
/// Panics when a header would make the walk stall or leave the arena; the
/// chain is only ever written by [`Split`], so that means the caller wrote
/// over a header through a stale handle.
pub struct Blocks<'arena> {
  arena: &'arena [u8],
  offset: usize,
}

impl<'arena> Blocks<'arena> {
  pub const fn new(arena: &'arena [u8]) -> Self {
    Self { arena, offset: 0 }
  }
}

impl Iterator for Blocks<'_> {
  type Item = (usize, Header);

  fn next(&mut self) -> Option<Self::Item> {
    let offset = self.offset;
    if offset >= self.arena.len() {
      return None;
    }

    let header = Header::read(self.arena, offset);
    let Some(header) = header.filter(|h| {
      h.size() >= HEADER_SIZE && offset + h.size() <= self.arena.len()
    }) else {
      panic!("corrupted block header at {}: {:?}", offset, header);
    };

    self.offset = offset + header.size();
    Some((offset, header))
  }
}
