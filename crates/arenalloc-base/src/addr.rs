use core::fmt;

/// Handle to a location inside an allocator's arena.
///
/// Wraps a byte offset from the start of the arena. Handles are only
/// meaningful for the allocator that produced them and only until the next
/// `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr(usize);

impl Addr {
  #[inline(always)]
  pub const fn new(offset: usize) -> Self {
    Self(offset)
  }

  #[inline(always)]
  pub const fn offset(self) -> usize {
    self.0
  }

  #[inline]
  pub const fn checked_sub(self, bytes: usize) -> Option<Self> {
    match self.0.checked_sub(bytes) {
      Some(offset) => Some(Self(offset)),
      None => None,
    }
  }
}

impl From<Addr> for usize {
  fn from(addr: Addr) -> Self {
    addr.0
  }
}

impl fmt::Display for Addr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "+{:#x}", self.0)
  }
}
