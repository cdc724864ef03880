// Rehash policy
//
// When the hash part has no free node left, every live integer key is counted
// into power-of-two bins and the array part is sized to the largest power of
// two that would be more than half full. Everything else goes to a hash part
// just big enough for the remaining keys plus the key being inserted.
//
// Resizes are built aside and swapped in at the end, so an allocation failure
// leaves the table exactly as it was.

use crate::{
    LuaError, LuaResult, LuaValue,
    gc::TableAllocator,
    lua_limits::{MAX_ABITS, MAX_ASIZE, MAX_HBITS},
    lua_table::{
        LuaTable,
        hash_table::{LuaHashTable, LuaInsertResult},
        key_slot::{KeySlot, classify},
        value_array::LuaValueArray,
    },
};

/// Smallest `hbits` with `2^hbits >= hsize`; 0 means no hash part.
#[inline]
pub(crate) fn hsize2hbits(hsize: u32) -> u32 {
    let hbits = match hsize {
        0 => 0,
        1 => 1,
        s => 1 + (31 - (s - 1).leading_zeros()),
    };
    hbits.min(MAX_HBITS)
}

/// Bin of an array-eligible key: 0 for key 0, `b` for keys in `[2^(b-1), 2^b)`.
#[inline(always)]
fn key_bin(k: u32) -> usize {
    (32 - k.leading_zeros()) as usize
}

/// Count `key` into `bins` if it could ever live in the array part.
#[inline]
fn count_int(key: &LuaValue, bins: &mut [u32; MAX_ABITS]) -> u32 {
    match key.as_integer() {
        Some(k) if (0..MAX_ASIZE as i64).contains(&k) => {
            bins[key_bin(k as u32)] += 1;
            1
        }
        _ => 0,
    }
}

/// Pick the array size for `nint` integer keys distributed over `bins`.
/// Returns `(asize, keys that land in the array)`.
pub(crate) fn best_asize(bins: &[u32; MAX_ABITS], nint: u32) -> (u32, u32) {
    let nn = nint as u64;
    let (mut sum, mut na, mut sz) = (0u64, 0u64, 0u64);
    for (b, &count) in bins.iter().enumerate() {
        let cap = 1u64 << b;
        if 2 * nn <= cap || sum == nn {
            break;
        }
        if count > 0 {
            sum += count as u64;
            if 2 * sum > cap {
                sz = cap;
                na = sum;
            }
        }
    }
    (sz as u32, na as u32)
}

impl<A: TableAllocator> LuaTable<A> {
    /// Resize for the current population plus `extra`, the key whose
    /// insertion found the hash part full.
    pub(crate) fn rehash(&mut self, extra: &LuaValue) -> LuaResult<()> {
        let mut bins = [0u32; MAX_ABITS];
        let mut nint = 0u32;
        let mut total = 0u32;

        for (i, v) in self.array.array.iter().enumerate() {
            if !v.is_nil() {
                bins[key_bin(i as u32)] += 1;
                nint += 1;
                total += 1;
            }
        }
        for node in self.hash.nodes() {
            if node.is_live() {
                nint += count_int(&node.key, &mut bins);
                total += 1;
            }
        }
        nint += count_int(extra, &mut bins);
        total += 1;

        let (asize, na) = best_asize(&bins, nint);
        self.resize(asize, hsize2hbits(total - na))
    }

    /// Rebuild both parts with the given sizes, migrating every live pair.
    /// If the keys that do not fit the array overflow `2^hbits` nodes, the
    /// hash part is doubled until they fit.
    pub(crate) fn resize(&mut self, asize: u32, hbits: u32) -> LuaResult<()> {
        let asize = asize.min(MAX_ASIZE);
        let mut hbits = hbits.min(MAX_HBITS);
        loop {
            let mut array = LuaValueArray::new(&mut self.alloc, asize)?;
            let mut hash = match LuaHashTable::new(&mut self.alloc, hbits) {
                Ok(hash) => hash,
                Err(e) => {
                    array.release(&mut self.alloc);
                    return Err(e);
                }
            };

            if self.migrate_into(&mut array, &mut hash) {
                self.array.release(&mut self.alloc);
                self.hash.release(&mut self.alloc);
                self.array = array;
                self.hash = hash;
                return Ok(());
            }

            array.release(&mut self.alloc);
            hash.release(&mut self.alloc);
            if hbits >= MAX_HBITS {
                return Err(LuaError::OutOfMemory);
            }
            hbits += 1;
        }
    }

    /// Copy every live pair into a new layout. False if the hash part is too
    /// small; the current layout is never touched.
    fn migrate_into(&self, array: &mut LuaValueArray, hash: &mut LuaHashTable) -> bool {
        let live_array = self
            .array
            .array
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nil())
            .map(|(i, v)| (LuaValue::Integer(i as i64), v));
        let live_hash = self
            .hash
            .nodes()
            .iter()
            .filter(|node| node.is_live())
            .map(|node| (node.key.clone(), &node.value));

        for (key, value) in live_array.chain(live_hash) {
            let placed = match classify(&key, array.asize()) {
                Some(KeySlot::Array(i)) => {
                    array.replace(i, value.clone());
                    true
                }
                Some(KeySlot::Hash(h)) => matches!(
                    hash.insert_new_key(key, h, value.clone()),
                    LuaInsertResult::Inserted
                ),
                None => true,
            };
            if !placed {
                return false;
            }
        }
        true
    }

    /// Set the array part to `nasize` slots, keeping the hash size when it
    /// has room. Array entries past the new size move to the hash part;
    /// hash integer keys the new array covers move into it.
    pub fn resize_array(&mut self, nasize: u32) -> LuaResult<()> {
        let hmask = self.hash.hmask();
        let hbits = if hmask == 0 { 0 } else { 32 - hmask.leading_zeros() };
        self.resize(nasize, hbits)
    }
}
