use arenalloc_base::prelude::*;
use rand::{
  Rng,
  SeedableRng,
  rngs::StdRng,
};

use crate::{
  header::Header,
  split::{
    Split,
    SplitError,
  },
};

const SIZE: usize = 4096;

type TestSplit = Split<SIZE>;

fn chain(split: &TestSplit) -> Vec<(usize, Header)> {
  split.blocks().collect()
}

fn assert_chain_invariants<const N: usize>(split: &Split<N>) {
  let mut total = 0;
  let mut previous_free = false;
  for (offset, header) in split.blocks() {
    assert_eq!(offset, total);
    assert!(
      !(previous_free && !header.is_allocated()),
      "adjacent free blocks at {}",
      offset
    );
    previous_free = !header.is_allocated();
    total += header.size();
  }
  assert_eq!(total, N);
}

fn powers_of_two() -> Vec<usize> {
  (0..=10).map(|shift| 1 << shift).collect()
}

#[test]
fn test_header_codec() {
  assert_eq!(Header::allocated(20).encode(), [41, 0, 0, 0]);
  assert_eq!(Header::free(1 << 20).encode(), [0, 0, 0x20, 0]);
  assert_eq!(Header::decode([41, 0, 0, 0]), Header::allocated(20));
  assert_eq!(
    Header::decode(Header::free(MAX_BLOCK_SIZE).encode()),
    Header::free(MAX_BLOCK_SIZE)
  );

  let mut bytes = [0u8; 6];
  Header::allocated(6).write(&mut bytes, 2);
  assert_eq!(bytes, [0, 0, 13, 0, 0, 0]);
  assert_eq!(Header::read(&bytes, 2), Some(Header::allocated(6)));
  assert_eq!(Header::read(&bytes, 3), None);
}

#[test]
#[should_panic]
fn test_header_rejects_wide_span() {
  let _ = Header::free(MAX_BLOCK_SIZE + 1);
}

#[test]
fn test_init_single_free_block() {
  let mut split = TestSplit::new();
  assert_eq!(chain(&split), vec![(0, Header::free(SIZE))]);

  split.alloc(100).unwrap();
  split.init();
  assert_eq!(chain(&split), vec![(0, Header::free(SIZE))]);
  assert!(split.arena()[HEADER_SIZE..].iter().all(|byte| *byte == 0));
  assert_eq!(split.capacity(), SIZE);
}

#[test]
fn test_alloc_splits_first_fit() {
  let mut split = TestSplit::new();

  let a = split.alloc(10).unwrap();
  let b = split.alloc(20).unwrap();
  assert_eq!(a, Addr::new(HEADER_SIZE));
  assert_eq!(b, Addr::new(14 + HEADER_SIZE));
  assert_eq!(
    chain(&split),
    vec![
      (0, Header::allocated(14)),
      (14, Header::allocated(24)),
      (38, Header::free(SIZE - 38)),
    ]
  );

  split.dealloc(a);
  let c = split.alloc(4).unwrap();
  assert_eq!(c, a);
  assert_eq!(split.header_at(0), Some(Header::allocated(8)));
  assert_eq!(split.header_at(8), Some(Header::free(6)));
  assert_chain_invariants(&split);
}

#[test]
fn test_invalid_requests() {
  let mut split = TestSplit::new();
  assert_eq!(split.try_alloc(0), Err(SplitError::ZeroSize));
  assert_eq!(
    split.try_alloc(SIZE - HEADER_SIZE + 1),
    Err(SplitError::TooLarge {
      bytes: SIZE - HEADER_SIZE + 1,
      limit: SIZE - HEADER_SIZE
    })
  );
  assert_eq!(
    split.try_alloc(usize::MAX).unwrap_err().kind(),
    FailureKind::InvalidRequest
  );
  assert_eq!(chain(&split), vec![(0, Header::free(SIZE))]);
}

#[test]
fn test_whole_arena_exact_fit() {
  let mut corrected = TestSplit::new();
  let addr = corrected.alloc(SIZE - HEADER_SIZE).unwrap();
  assert_eq!(chain(&corrected), vec![(0, Header::allocated(SIZE))]);
  assert_eq!(
    corrected.try_alloc(1),
    Err(SplitError::OutOfMemory {
      required: 1 + HEADER_SIZE
    })
  );
  corrected.dealloc(addr);
  assert_eq!(chain(&corrected), vec![(0, Header::free(SIZE))]);

  let mut legacy = TestSplit::with_policy(Policy::Legacy);
  assert_eq!(
    legacy.try_alloc(SIZE - HEADER_SIZE).unwrap_err().kind(),
    FailureKind::OutOfMemory
  );
}

#[test]
fn test_exact_fit_reuse_depends_on_policy() {
  for (policy, reused) in [(Policy::Corrected, true), (Policy::Legacy, false)] {
    let mut split = TestSplit::with_policy(policy);
    let a = split.alloc(16).unwrap();
    split.alloc(16).unwrap();
    split.dealloc(a);

    let again = split.alloc(16).unwrap();
    assert_eq!(again == a, reused, "{:?}", policy);
    assert_chain_invariants(&split);
  }
}

#[test]
fn test_small_remainder_is_absorbed() {
  let mut split = Split::<64>::new();
  let addr = split.alloc(58).unwrap();
  assert_eq!(split.blocks().collect::<Vec<_>>(), vec![(0, Header::allocated(64))]);
  assert_eq!(split.usable_size(addr), Some(60));

  let mut legacy = Split::<64>::with_policy(Policy::Legacy);
  let addr = legacy.alloc(57).unwrap();
  assert_eq!(legacy.usable_size(addr), Some(60));
  assert_chain_invariants(&legacy);
}

#[test]
fn test_free_orders_collapse_to_one_block() {
  for policy in [Policy::Corrected, Policy::Legacy] {
    let orders: [Vec<usize>; 3] = [
      (0..11).collect(),
      (0..11).rev().collect(),
      (0..11).step_by(2).chain((1..11).step_by(2)).collect(),
    ];

    for order in orders {
      let mut split = TestSplit::with_policy(policy);
      let addrs: Vec<Addr> = powers_of_two()
        .into_iter()
        .map(|bytes| split.alloc(bytes).unwrap())
        .collect();
      assert_eq!(split.statistics().count_allocated(), 11);

      for index in order {
        split.dealloc(addrs[index]);
        assert_chain_invariants(&split);
      }
      assert_eq!(chain(&split), vec![(0, Header::free(SIZE))]);
    }
  }
}

#[test]
fn test_coalesce_with_both_neighbours() {
  let mut split = TestSplit::new();
  let a = split.alloc(32).unwrap();
  let b = split.alloc(32).unwrap();
  let c = split.alloc(32).unwrap();
  let d = split.alloc(32).unwrap();

  split.dealloc(a);
  split.dealloc(c);
  assert_eq!(split.statistics().count_free(), 3);

  split.dealloc(b);
  assert_eq!(
    chain(&split),
    vec![
      (0, Header::free(108)),
      (108, Header::allocated(36)),
      (144, Header::free(SIZE - 144)),
    ]
  );

  split.dealloc(d);
  assert_eq!(chain(&split), vec![(0, Header::free(SIZE))]);
}

#[test]
fn test_dealloc_guards() {
  let mut split = TestSplit::new();
  let a = split.alloc(10).unwrap();
  let b = split.alloc(10).unwrap();
  split.alloc(10).unwrap();
  let before = chain(&split);

  assert_eq!(
    split.try_dealloc(Addr::new(0)),
    Err(SplitError::InvalidAddress { offset: 0 })
  );
  assert_eq!(
    split.try_dealloc(Addr::new(a.offset() + 1)),
    Err(SplitError::InvalidAddress {
      offset: a.offset() + 1
    })
  );
  assert_eq!(
    split.try_dealloc(Addr::new(SIZE * 2)).unwrap_err().kind(),
    FailureKind::InvalidAddress
  );
  assert_eq!(chain(&split), before);

  split.dealloc(b);
  let freed = chain(&split);
  assert_eq!(
    split.try_dealloc(b),
    Err(SplitError::DoubleFree { offset: b.offset() })
  );
  assert_eq!(chain(&split), freed);

  split.dealloc(a);
  // merged into the head block, no longer a block start
  assert_eq!(
    split.try_dealloc(b),
    Err(SplitError::InvalidAddress { offset: b.offset() })
  );
  assert_eq!(split.statistics().total_allocated(), 14);
}

#[test]
fn test_statistics_cover_arena() {
  let mut split = TestSplit::new();
  let a = split.alloc(100).unwrap();
  split.alloc(50).unwrap();
  split.dealloc(a);

  let stats = split.statistics();
  assert_eq!(stats.allocated(), &vec![54]);
  assert_eq!(stats.free(), &vec![104, SIZE - 158]);
  assert_eq!(stats.total_allocated() + stats.total_free(), SIZE);
  assert_eq!(
    split.regions().collect::<Vec<_>>(),
    vec![
      Region::free(0, 104),
      Region::allocated(104, 54),
      Region::free(158, SIZE - 158),
    ]
  );
}

#[test]
fn test_payloads_do_not_touch_headers() {
  let mut split = TestSplit::new();
  let addrs: Vec<Addr> = powers_of_two()
    .into_iter()
    .map(|bytes| split.alloc(bytes).unwrap())
    .collect();

  for (i, addr) in addrs.iter().enumerate() {
    let payload = split.payload_mut(*addr).unwrap();
    assert_eq!(payload.len(), 1 << i);
    payload.fill(0xff);
  }

  assert_chain_invariants(&split);
  assert_eq!(split.statistics().count_allocated(), addrs.len());
  for addr in addrs {
    split.try_dealloc(addr).unwrap();
  }
  assert_eq!(chain(&split), vec![(0, Header::free(SIZE))]);
}

#[test]
fn test_random_sequences_keep_chain_consistent() {
  let mut rng = StdRng::seed_from_u64(0x0005_911d);
  let mut split = Split::<2048>::new();
  let mut live: Vec<(Addr, usize)> = Vec::new();

  for _ in 0..4000 {
    if live.is_empty() || rng.random_bool(0.6) {
      let bytes = rng.random_range(1..=200);
      if let Some(addr) = split.alloc(bytes) {
        live.push((addr, bytes));
      }
    } else {
      let victim = rng.random_range(0..live.len());
      let (addr, _) = live.swap_remove(victim);
      split.try_dealloc(addr).unwrap();
    }

    assert_chain_invariants(&split);
    for (addr, bytes) in &live {
      assert!(split.usable_size(*addr).unwrap() >= *bytes);
    }
    assert_eq!(split.statistics().count_allocated(), live.len());
  }

  for (addr, _) in live.drain(..) {
    split.dealloc(addr);
  }
  assert_eq!(
    split.blocks().collect::<Vec<_>>(),
    vec![(0, Header::free(2048))]
  );
}
