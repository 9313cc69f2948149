#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod addr;
pub mod config;
pub mod contract;
pub mod region;
pub mod stats;


pub use addr::Addr;
pub use config::Policy;
pub use contract::{
  ArenaAlloc,
  FailureKind,
};
pub use region::{
  Region,
  RegionState,
};
pub use stats::Statistics;

pub mod prelude {
  pub use super::{
    Addr,
    ArenaAlloc,
    FailureKind,
    Policy,
    Region,
    RegionState,
    Statistics,
    config::{
      BITS_IN_BYTE,
      HEADER_SIZE,
      MAX_BLOCK_SIZE,
      MAX_RUN_CHUNKS,
      MEMORY_SIZE,
      PAGE_SIZE,
    },
  };
}
