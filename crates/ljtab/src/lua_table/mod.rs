// LuaTable - hybrid array/hash table
//
// Integer keys in [0, asize) live in a dense array part; every other key lives
// in a chained scatter hash part (hash_table.rs). The array size and the hash
// size are chosen independently by the rehash policy (rehash.rs) whenever the
// hash part runs out of free nodes. Traversal, length and introspection are in
// traverse.rs.
mod hash_table;
mod key_slot;
mod rehash;
mod traverse;
mod value_array;

pub use key_slot::{HASH_BIAS, HASH_ROT1, HASH_ROT2, HASH_ROT3, hash_key, hashrot};
pub use traverse::TableIter;

use crate::{
    LuaError, LuaResult, LuaStr, LuaValue,
    gc::{SystemAllocator, TableAllocator},
    lua_limits::{MAX_ASIZE, MIN_ARRAY_GROW},
    lua_table::{
        hash_table::{LuaHashTable, LuaInsertResult},
        key_slot::{KeySlot, classify, classify_int, normalize_key},
        rehash::hsize2hbits,
        value_array::LuaValueArray,
    },
};

pub struct LuaTable<A: TableAllocator = SystemAllocator> {
    array: LuaValueArray,
    hash: LuaHashTable,
    /// Live keys across both parts.
    live: u32,
    alloc: A,
}

/// Shape and population snapshot, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableStats {
    pub asize: u32,
    pub hash_capacity: u32,
    pub array_live: u32,
    pub hash_live: u32,
    pub hash_dead: u32,
    pub bytes: usize,
}

impl LuaTable {
    /// Create a table with room for `asize` array slots and about `hsize`
    /// hash keys.
    ///
    /// Panics if the storage cannot be allocated, like `Vec::with_capacity`;
    /// use [`LuaTable::new_in`] to handle that case.
    pub fn new(asize: u32, hsize: u32) -> Self {
        match Self::new_in(asize, hsize, SystemAllocator) {
            Ok(table) => table,
            Err(e) => panic!("Failed to allocate table: {e}"),
        }
    }

    /// Signed size hints as they come out of a table constructor; negative
    /// hints mean "none".
    pub fn new_ah(a: i32, h: i32) -> Self {
        Self::new(a.max(0) as u32, h.max(0) as u32)
    }
}

impl Default for LuaTable {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl<A: TableAllocator> LuaTable<A> {
    pub fn new_in(asize: u32, hsize: u32, mut alloc: A) -> LuaResult<Self> {
        let array = LuaValueArray::new(&mut alloc, asize.min(MAX_ASIZE))?;
        let hash = match LuaHashTable::new(&mut alloc, hsize2hbits(hsize)) {
            Ok(hash) => hash,
            Err(e) => {
                array.release(&mut alloc);
                return Err(e);
            }
        };
        Ok(Self {
            array,
            hash,
            live: 0,
            alloc,
        })
    }

    #[inline(always)]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Size of the array part.
    #[inline(always)]
    pub fn asize(&self) -> u32 {
        self.array.asize()
    }

    /// Usable node count of the hash part, 0 when there is none.
    #[inline(always)]
    pub fn hash_capacity(&self) -> u32 {
        self.hash.capacity()
    }

    #[inline(always)]
    pub fn get(&self, key: &LuaValue) -> Option<&LuaValue> {
        match classify(key, self.array.asize())? {
            KeySlot::Array(i) => self.array.get(i),
            KeySlot::Hash(hash) => self.hash.get(key, hash),
        }
    }

    #[inline(always)]
    pub fn get_int(&self, key: i64) -> Option<&LuaValue> {
        match classify_int(key, self.array.asize()) {
            KeySlot::Array(i) => self.array.get(i),
            KeySlot::Hash(hash) => self.hash.get(&LuaValue::Integer(key), hash),
        }
    }

    /// Short-string lookup: interned strings hash by id and compare by identity.
    #[inline(always)]
    pub fn get_str(&self, key: &LuaStr) -> Option<&LuaValue> {
        let idx = self
            .hash
            .find_with(key.sid(), |k| matches!(k, LuaValue::String(s) if s == key))?;
        let node = self.hash.node(idx);
        if node.is_live() { Some(&node.value) } else { None }
    }

    /// Store `value` under `key`. A nil value removes the key.
    ///
    /// Fails with `InvalidKey` for nil/NaN keys and with `OutOfMemory` when
    /// the table had to grow and could not; the table is unchanged then.
    pub fn set(&mut self, key: LuaValue, value: LuaValue) -> LuaResult<()> {
        let key = normalize_key(key).ok_or(LuaError::InvalidKey)?;
        if value.is_nil() {
            self.remove(&key);
            return Ok(());
        }
        let slot = classify(&key, self.array.asize()).ok_or(LuaError::InvalidKey)?;
        self.set_slot(key, slot, value)
    }

    #[inline(always)]
    pub fn set_int(&mut self, key: i64, value: LuaValue) -> LuaResult<()> {
        if value.is_nil() {
            self.remove(&LuaValue::Integer(key));
            return Ok(());
        }
        let slot = classify_int(key, self.array.asize());
        self.set_slot(LuaValue::Integer(key), slot, value)
    }

    #[inline(always)]
    pub fn set_str(&mut self, key: LuaStr, value: LuaValue) -> LuaResult<()> {
        self.set(LuaValue::String(key), value)
    }

    fn set_slot(&mut self, key: LuaValue, slot: KeySlot, value: LuaValue) -> LuaResult<()> {
        match slot {
            KeySlot::Array(i) => {
                if self.array.replace(i, value).is_nil() {
                    self.live += 1;
                }
                Ok(())
            }
            KeySlot::Hash(hash) => {
                // existing key, possibly dead: overwrite in place
                if let Some(idx) = self.hash.find(&key, hash) {
                    if self.hash.replace_value(idx, value).is_nil() {
                        self.live += 1;
                    }
                    return Ok(());
                }

                if let LuaValue::Integer(k) = key {
                    if k == self.array.asize() as i64 && self.grow_array_for_append() {
                        self.array.replace(k as u32, value);
                        self.live += 1;
                        return Ok(());
                    }
                }

                match self.hash.insert_new_key(key, hash, value) {
                    LuaInsertResult::Inserted => {
                        self.live += 1;
                        Ok(())
                    }
                    LuaInsertResult::Full(key, value) => {
                        self.rehash(&key)?;
                        self.set(key, value)
                    }
                }
            }
        }
    }

    /// Append fast path: double the array part so key `asize` fits, pulling
    /// any integer keys the larger array now covers out of the hash part.
    /// Returns false when the grown array would be too sparse or could not be
    /// had; the key then takes the hash path.
    fn grow_array_for_append(&mut self) -> bool {
        let asize = self.array.asize();
        if asize >= MAX_ASIZE {
            return false;
        }
        let new_asize = asize.saturating_mul(2).clamp(MIN_ARRAY_GROW, MAX_ASIZE);
        // the grown array must stay more than half full, as a rehash would
        // require; sparse appends take the hash path instead
        if new_asize > MIN_ARRAY_GROW
            && self.append_population(asize, new_asize) * 2 <= new_asize
        {
            return false;
        }
        if self.array.grow(&mut self.alloc, new_asize).is_err() {
            return false;
        }
        if self.hash.capacity() > 0 {
            for k in asize..new_asize {
                let key = LuaValue::Integer(k as i64);
                if let Some(idx) = self.hash.find(&key, hash_key(&key)) {
                    let value = self.hash.replace_value(idx, LuaValue::nil());
                    self.array.replace(k, value);
                }
            }
        }
        true
    }

    /// Live keys the array would hold after growing from `asize` to
    /// `new_asize`, counting the key being appended at `asize`.
    fn append_population(&self, asize: u32, new_asize: u32) -> u32 {
        let mut live = self.array.live_count() + 1;
        if self.hash.capacity() > 0 {
            for k in asize + 1..new_asize {
                let key = LuaValue::Integer(k as i64);
                if self.hash.get(&key, hash_key(&key)).is_some() {
                    live += 1;
                }
            }
        }
        live
    }

    /// Remove `key`, returning its value. Hash entries become dead keys so
    /// a traversal positioned on them can continue.
    pub fn remove(&mut self, key: &LuaValue) -> Option<LuaValue> {
        let old = match classify(key, self.array.asize())? {
            KeySlot::Array(i) => {
                let old = self.array.replace(i, LuaValue::nil());
                if old.is_nil() { None } else { Some(old) }
            }
            KeySlot::Hash(hash) => self.hash.remove(key, hash),
        };
        if old.is_some() {
            self.live -= 1;
        }
        old
    }

    #[inline]
    pub fn contains_key(&self, key: &LuaValue) -> bool {
        self.get(key).is_some()
    }

    /// Drop every value but keep the allocated shape.
    pub fn clear(&mut self) {
        self.array.clear();
        self.hash.clear();
        self.live = 0;
    }

    /// Number of live keys.
    #[inline(always)]
    pub fn key_count(&self) -> u32 {
        self.live
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// True when no live key sits in the hash part.
    pub fn is_array(&self) -> bool {
        self.hash.live_count() == 0
    }

    pub fn stats(&self) -> TableStats {
        let bytes = self.array.asize() as usize * std::mem::size_of::<LuaValue>()
            + self.hash.node_count() * std::mem::size_of::<hash_table::Node>();
        TableStats {
            asize: self.array.asize(),
            hash_capacity: self.hash.capacity(),
            array_live: self.array.live_count(),
            hash_live: self.hash.live_count(),
            hash_dead: self.hash.dead_count(),
            bytes,
        }
    }

    /// Duplicate the table with freshly allocated storage of the same shape.
    /// Object references are copied, not the objects.
    pub fn try_clone(&self) -> LuaResult<Self>
    where
        A: Clone,
    {
        let mut alloc = self.alloc.clone();
        let array = self.array.try_clone(&mut alloc)?;
        let hash = match self.hash.try_clone(&mut alloc) {
            Ok(hash) => hash,
            Err(e) => {
                array.release(&mut alloc);
                return Err(e);
            }
        };
        Ok(Self {
            array,
            hash,
            live: self.live,
            alloc,
        })
    }
}

impl<A: TableAllocator + Clone> Clone for LuaTable<A> {
    /// Panics on allocation failure like `Vec::clone`; see [`LuaTable::try_clone`].
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(table) => table,
            Err(e) => panic!("Failed to clone table: {e}"),
        }
    }
}

impl<A: TableAllocator> Drop for LuaTable<A> {
    fn drop(&mut self) {
        self.array.release(&mut self.alloc);
        self.hash.release(&mut self.alloc);
    }
}

impl<A: TableAllocator> std::fmt::Debug for LuaTable<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
