//! C ABI over two process-wide arenas.
//!
//! Both instances use [`Policy::Legacy`] so the exported functions size
//! requests exactly like the historical `fsa_*` / `ssa_*` interface.
//! Returned pointers point into the static arenas; they stay valid until
//! the matching `*_init` and must not be used concurrently with calls that
//! touch the same allocation.

use core::ptr;
use std::io::{
  self,
  Write,
};

use arenalloc::prelude::*;
use libc::{
  c_void,
  size_t,
};
use spin::Mutex;


static FSA: Mutex<Fsa> = Mutex::new(Fsa::with_policy(Policy::Legacy));
static SSA: Mutex<Ssa> = Mutex::new(Ssa::with_policy(Policy::Legacy));

fn to_ptr<A: ArenaAlloc>(alloc: &mut A, addr: Option<Addr>) -> *mut c_void {
  match addr {
    Some(addr) => alloc.arena_mut().as_mut_ptr().wrapping_add(addr.offset()).cast(),
    None => ptr::null_mut(),
  }
}

fn to_addr<A: ArenaAlloc>(alloc: &A, ptr: *mut c_void) -> Option<Addr> {
  if ptr.is_null() {
    return None;
  }
  let base = alloc.arena().as_ptr() as usize;
  let offset = (ptr as usize).checked_sub(base)?;
  (offset < alloc.capacity()).then(|| Addr::new(offset))
}

fn address_from_memory<A: ArenaAlloc>(alloc: &mut A, index: size_t) -> *mut c_void {
  let addr = (index < alloc.capacity()).then(|| Addr::new(index));
  to_ptr(alloc, addr)
}

fn print_statistics(stats: &Statistics) {
  let mut out = io::stdout().lock();
  let _ = write!(out, "{}", stats);
  let _ = out.flush();
}

#[unsafe(no_mangle)]
pub extern "C" fn fsa_init() {
  FSA.lock().init();
}

#[unsafe(no_mangle)]
pub extern "C" fn fsa_alloc(bytes: size_t) -> *mut c_void {
  let mut fsa = FSA.lock();
  let addr = fsa.alloc(bytes);
  to_ptr(&mut *fsa, addr)
}

#[unsafe(no_mangle)]
pub extern "C" fn fsa_dealloc(addr_p: *mut c_void) {
  let mut fsa = FSA.lock();
  if let Some(addr) = to_addr(&*fsa, addr_p) {
    fsa.dealloc(addr);
  }
}

#[unsafe(no_mangle)]
pub extern "C" fn fsa_get_statistics() {
  let stats = FSA.lock().statistics();
  print_statistics(&stats);
}

#[unsafe(no_mangle)]
pub extern "C" fn fsa_get_size_of_memory() -> size_t {
  FSA.lock().capacity()
}

#[unsafe(no_mangle)]
pub extern "C" fn fsa_get_address_from_memory(index: size_t) -> *mut c_void {
  address_from_memory(&mut *FSA.lock(), index)
}

#[unsafe(no_mangle)]
pub extern "C" fn fsa_get_size_of_available_chunks() -> size_t {
  FSA.lock().bitmap_len()
}

/// Bitmap byte at `index`, 0 past the end.
#[unsafe(no_mangle)]
pub extern "C" fn fsa_get_available_chunks(index: size_t) -> u8 {
  FSA.lock().bitmap_byte(index).unwrap_or(0)
}

#[unsafe(no_mangle)]
pub extern "C" fn fsa_get_size_of_number_of_chunks() -> size_t {
  FSA.lock().runs_len()
}

/// Run length recorded for chunk `index`, 0 past the end.
#[unsafe(no_mangle)]
pub extern "C" fn fsa_get_number_of_chunks(index: size_t) -> u8 {
  FSA.lock().run_length(index).unwrap_or(0)
}

#[unsafe(no_mangle)]
pub extern "C" fn ssa_init() {
  SSA.lock().init();
}

#[unsafe(no_mangle)]
pub extern "C" fn ssa_alloc(bytes: size_t) -> *mut c_void {
  let mut ssa = SSA.lock();
  let addr = ssa.alloc(bytes);
  to_ptr(&mut *ssa, addr)
}

#[unsafe(no_mangle)]
pub extern "C" fn ssa_dealloc(addr_p: *mut c_void) {
  let mut ssa = SSA.lock();
  if let Some(addr) = to_addr(&*ssa, addr_p) {
    ssa.dealloc(addr);
  }
}

#[unsafe(no_mangle)]
pub extern "C" fn ssa_get_statistics() {
  let stats = SSA.lock().statistics();
  print_statistics(&stats);
}

#[unsafe(no_mangle)]
pub extern "C" fn ssa_get_size_of_memory() -> size_t {
  SSA.lock().capacity()
}

#[unsafe(no_mangle)]
pub extern "C" fn ssa_get_address_from_memory(index: size_t) -> *mut c_void {
  address_from_memory(&mut *SSA.lock(), index)
}
