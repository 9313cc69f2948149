#![cfg_attr(not(test), no_std)]

use arenalloc_base::config::{
  BITS_IN_BYTE,
  MEMORY_SIZE,
  PAGE_SIZE,
};

pub use arenalloc_base::{
  Addr,
  ArenaAlloc,
  FailureKind,
  Policy,
  Region,
  RegionState,
  Statistics,
};
pub use arenalloc_fixed::{
  Fixed,
  FixedError,
};
pub use arenalloc_split::{
  Header,
  Split,
  SplitError,
};


pub mod prelude {
  pub use arenalloc_base::prelude::*;
  pub use arenalloc_fixed::{
    Fixed,
    FixedError,
  };
  pub use arenalloc_split::{
    Header,
    Split,
    SplitError,
  };

  pub use super::{
    Fsa,
    Ssa,
  };
}

/// Bitmap chunk allocator with the default geometry: a 1 MiB arena of
/// 4 KiB chunks.
pub type Fsa = Fixed<PAGE_SIZE, { MEMORY_SIZE / PAGE_SIZE / BITS_IN_BYTE }>;

/// Split first-fit allocator over a 1 MiB arena.
pub type Ssa = Split<MEMORY_SIZE>;
