// Allocation port for table storage
//
// Tables never talk to the global allocator directly for accounting purposes.
// Every array or node buffer is first announced to a `TableAllocator`, which
// may refuse it (OutOfMemory) or record it against a collector's debt, and is
// then reserved fallibly. Frees are reported exactly once, when the buffer is
// replaced by a resize or when the table is dropped.
//
// Accounting model (GCdebt style):
// - total_bytes: bytes currently owned by tables reporting to this account
// - gc_debt: decreases on allocation, increases on free; a collector external
//   to this crate runs a step when it drops to zero or below

use std::cell::RefCell;
use std::rc::Rc;

use crate::{LuaError, LuaResult};

/// Memory service consumed by tables.
///
/// `allocate`/`grow` must either accept the whole request or refuse it without
/// changing any state.
pub trait TableAllocator {
    fn allocate(&mut self, bytes: usize) -> LuaResult<()>;

    fn grow(&mut self, old_bytes: usize, new_bytes: usize) -> LuaResult<()>;

    /// Never fails; also used to hand back a `grow` whose storage could not
    /// be reserved.
    fn free(&mut self, bytes: usize);
}

/// Accepts every request; real exhaustion still surfaces through the fallible
/// `Vec` reservation behind every table buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAllocator;

impl TableAllocator for SystemAllocator {
    #[inline(always)]
    fn allocate(&mut self, _bytes: usize) -> LuaResult<()> {
        Ok(())
    }

    #[inline(always)]
    fn grow(&mut self, _old_bytes: usize, _new_bytes: usize) -> LuaResult<()> {
        Ok(())
    }

    #[inline(always)]
    fn free(&mut self, _bytes: usize) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcStats {
    pub bytes_allocated: usize,
    pub bytes_freed: usize,
    pub refused_requests: usize,
}

#[derive(Debug, Default)]
struct GcLedger {
    total_bytes: usize,
    gc_debt: isize,
    limit: Option<usize>,
    stats: GcStats,
}

/// Shared byte account, clonable into every table of one runtime.
#[derive(Debug, Clone, Default)]
pub struct GcAccount {
    ledger: Rc<RefCell<GcLedger>>,
}

impl GcAccount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account that refuses any request pushing `total_bytes` above `limit`.
    pub fn with_limit(limit: usize) -> Self {
        let account = Self::default();
        account.ledger.borrow_mut().limit = Some(limit);
        account
    }

    pub fn set_limit(&self, limit: Option<usize>) {
        self.ledger.borrow_mut().limit = limit;
    }

    pub fn total_bytes(&self) -> usize {
        self.ledger.borrow().total_bytes
    }

    pub fn gc_debt(&self) -> isize {
        self.ledger.borrow().gc_debt
    }

    /// Set the debt a collector wants to be notified at, keeping total_bytes.
    pub fn set_debt(&self, debt: isize) {
        self.ledger.borrow_mut().gc_debt = debt;
    }

    /// Like Lua's `GCdebt <= 0` check.
    pub fn should_collect(&self) -> bool {
        self.ledger.borrow().gc_debt <= 0
    }

    pub fn stats(&self) -> GcStats {
        self.ledger.borrow().stats.clone()
    }

    fn charge(&self, bytes: usize) -> LuaResult<()> {
        let mut ledger = self.ledger.borrow_mut();
        let new_total = ledger
            .total_bytes
            .checked_add(bytes)
            .ok_or(LuaError::OutOfMemory)?;
        if ledger.limit.is_some_and(|limit| new_total > limit) {
            ledger.stats.refused_requests += 1;
            return Err(LuaError::OutOfMemory);
        }
        ledger.total_bytes = new_total;
        ledger.gc_debt -= bytes as isize;
        ledger.stats.bytes_allocated += bytes;
        Ok(())
    }

    fn release(&self, bytes: usize) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.total_bytes = ledger.total_bytes.saturating_sub(bytes);
        ledger.gc_debt += bytes as isize;
        ledger.stats.bytes_freed += bytes;
    }
}

impl TableAllocator for GcAccount {
    fn allocate(&mut self, bytes: usize) -> LuaResult<()> {
        self.charge(bytes)
    }

    fn grow(&mut self, old_bytes: usize, new_bytes: usize) -> LuaResult<()> {
        if new_bytes >= old_bytes {
            self.charge(new_bytes - old_bytes)
        } else {
            self.release(old_bytes - new_bytes);
            Ok(())
        }
    }

    fn free(&mut self, bytes: usize) {
        self.release(bytes);
    }
}

#[inline]
pub(crate) fn slot_bytes<T>(len: usize) -> LuaResult<usize> {
    len.checked_mul(std::mem::size_of::<T>())
        .ok_or(LuaError::OutOfMemory)
}

/// Allocate `len` slots filled with `fill`, accounted against `alloc`.
/// On failure nothing stays charged.
pub(crate) fn alloc_slots<T: Clone, A: TableAllocator>(
    alloc: &mut A,
    len: usize,
    fill: T,
) -> LuaResult<Vec<T>> {
    let bytes = slot_bytes::<T>(len)?;
    alloc.allocate(bytes)?;
    let mut slots = Vec::new();
    if let Err(e) = slots.try_reserve_exact(len) {
        alloc.free(bytes);
        return Err(e.into());
    }
    slots.resize(len, fill);
    Ok(slots)
}

/// Accounted copy of `src`, for table duplication.
pub(crate) fn alloc_copy<T: Clone, A: TableAllocator>(alloc: &mut A, src: &[T]) -> LuaResult<Vec<T>> {
    let bytes = slot_bytes::<T>(src.len())?;
    alloc.allocate(bytes)?;
    let mut slots = Vec::new();
    if let Err(e) = slots.try_reserve_exact(src.len()) {
        alloc.free(bytes);
        return Err(e.into());
    }
    slots.extend_from_slice(src);
    Ok(slots)
}

/// Grow `slots` in place to `new_len`, filling with `fill`.
/// On failure `slots` and the account are untouched.
pub(crate) fn grow_slots<T: Clone, A: TableAllocator>(
    alloc: &mut A,
    slots: &mut Vec<T>,
    new_len: usize,
    fill: T,
) -> LuaResult<()> {
    let old_bytes = slot_bytes::<T>(slots.len())?;
    let new_bytes = slot_bytes::<T>(new_len)?;
    alloc.grow(old_bytes, new_bytes)?;
    if let Err(e) = slots.try_reserve_exact(new_len.saturating_sub(slots.len())) {
        // only growth can fail to reserve: return the extra bytes
        alloc.free(new_bytes - old_bytes);
        return Err(e.into());
    }
    slots.resize(new_len, fill);
    Ok(())
}

/// Report a buffer of `len` slots as released.
#[inline]
pub(crate) fn free_slots<T, A: TableAllocator>(alloc: &mut A, len: usize) {
    if let Ok(bytes) = slot_bytes::<T>(len) {
        alloc.free(bytes);
    }
}
