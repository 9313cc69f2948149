use core::fmt::Debug;

use crate::{
  addr::Addr,
  region::Region,
  stats::Statistics,
};

/// Coarse classification of a refused request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  /// The request is well formed but no free span can hold it.
  OutOfMemory,
  /// The request can never be served, whatever the arena state.
  InvalidRequest,
  /// The address does not name a live allocation.
  InvalidAddress,
}

/// The four-operation contract shared by every arena allocator.
///
/// `try_*` report why a request was refused; `alloc` and `dealloc` collapse
/// every failure into `None` or a silent no-op.
pub trait ArenaAlloc {
  type Error: Debug;

  /// Zeroes the arena and resets all bookkeeping. Outstanding handles
  /// become meaningless.
  fn init(&mut self);

  fn try_alloc(&mut self, bytes: usize) -> Result<Addr, Self::Error>;

  fn try_dealloc(&mut self, addr: Addr) -> Result<(), Self::Error>;

  /// Read-only walk over the current regions in arena order.
  fn regions(&self) -> impl Iterator<Item = Region>;

  /// Bytes the caller may use at `addr`, if it names a live allocation.
  fn usable_size(&self, addr: Addr) -> Option<usize>;

  fn arena(&self) -> &[u8];

  fn arena_mut(&mut self) -> &mut [u8];

  #[inline]
  fn capacity(&self) -> usize {
    self.arena().len()
  }

  #[inline]
  fn alloc(&mut self, bytes: usize) -> Option<Addr> {
    self.try_alloc(bytes).ok()
  }

  #[inline]
  fn dealloc(&mut self, addr: Addr) {
    let _ = self.try_dealloc(addr);
  }

  fn statistics(&self) -> Statistics {
    Statistics::collect(self.regions())
  }

  /// The payload of a live allocation.
  fn payload_mut(&mut self, addr: Addr) -> Option<&mut [u8]> {
    let len = self.usable_size(addr)?;
    let start = addr.offset();
    self.arena_mut().get_mut(start..start + len)
  }
}
