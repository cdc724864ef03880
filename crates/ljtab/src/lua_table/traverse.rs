// Traversal and length
//
// A traversal position is a flat index: `[0, asize)` are array slots and
// `asize + n` is hash node `n`. `next` recomputes the position of the previous
// key on every call, so it needs no iterator state. Removing keys during a
// traversal is safe: array slots never move and removed hash keys stay in
// their node as dead keys until the next rebuild. Inserting a new key during
// a traversal is unsupported: it may relocate nodes or rebuild the table, and
// the remaining order is then unspecified.

use crate::{
    LuaValue,
    gc::{SystemAllocator, TableAllocator},
    lua_table::{
        LuaTable,
        key_slot::{KeySlot, classify},
    },
};

impl<A: TableAllocator> LuaTable<A> {
    /// Traversal position of `key`: its array index, or `asize` plus its hash
    /// node. `None` if the key was never stored in the current layout.
    pub fn key_index(&self, key: &LuaValue) -> Option<u32> {
        match classify(key, self.array.asize())? {
            KeySlot::Array(i) => Some(i),
            KeySlot::Hash(hash) => {
                let idx = self.hash.find(key, hash)?;
                Some(self.array.asize() + idx as u32)
            }
        }
    }

    /// First live pair at traversal position `pos` or later.
    fn next_at(&self, pos: usize) -> Option<(usize, LuaValue, &LuaValue)> {
        let asize = self.array.asize() as usize;
        if pos < asize {
            if let Some((i, v)) = self.array.next_live(pos as u32) {
                return Some((i as usize, LuaValue::Integer(i as i64), v));
            }
        }
        let (idx, node) = self.hash.next_live(pos.saturating_sub(asize))?;
        Some((asize + idx, node.key.clone(), &node.value))
    }

    /// Stateless traversal step: the live pair following `key`, or the first
    /// one for `None`/`Nil`. Array slots come first in index order, then hash
    /// nodes in slot order. Returns `None` at the end and for a key that is
    /// not in the table.
    pub fn next(&self, key: Option<&LuaValue>) -> Option<(LuaValue, &LuaValue)> {
        let pos = match key {
            None | Some(LuaValue::Nil) => 0,
            Some(key) => self.key_index(key)? as usize + 1,
        };
        self.next_at(pos).map(|(_, k, v)| (k, v))
    }

    /// Borrowing iterator over live pairs, in `next` order.
    pub fn iter(&self) -> TableIter<'_, A> {
        TableIter { table: self, pos: 0 }
    }

    #[inline(always)]
    fn has_int(&self, key: i64) -> bool {
        self.get_int(key).is_some()
    }

    /// `n` with `n == 0` or key `n - 1` present, and key `n` absent.
    #[inline]
    fn is_border(&self, n: u32) -> bool {
        (n == 0 || self.has_int(n as i64 - 1)) && !self.has_int(n as i64)
    }

    /// Length of the sequence `0..n`. With holes any border may be returned.
    pub fn length(&self) -> u32 {
        let asize = self.array.asize();
        if asize > 0 && !self.array.is_live(asize - 1) {
            // border inside the array part: lo is 0 or follows a live slot,
            // hi is empty
            let (mut lo, mut hi) = (0u32, asize - 1);
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if self.array.is_live(mid) {
                    lo = mid + 1;
                } else {
                    hi = mid;
                }
            }
            return lo;
        }
        if self.hash.capacity() == 0 || !self.has_int(asize as i64) {
            return asize;
        }
        self.hash_border(asize)
    }

    /// Unbound search past the array part, `live` being a present key.
    fn hash_border(&self, live: u32) -> u32 {
        let mut i = live as u64;
        let mut j = i + 1;
        while self.has_int(j as i64) {
            i = j;
            if j > u32::MAX as u64 / 2 {
                // pathological: walk the keys one by one
                let mut n = live as u64 + 1;
                while n < u32::MAX as u64 && self.has_int(n as i64) {
                    n += 1;
                }
                return n as u32;
            }
            j *= 2;
        }
        // i present, j absent
        while j - i > 1 {
            let m = i + (j - i) / 2;
            if self.has_int(m as i64) {
                i = m;
            } else {
                j = m;
            }
        }
        j as u32
    }

    /// `length` with a guess from a previous call; cheap when the table only
    /// grew or shrank by one at the end since then.
    pub fn length_hint(&self, hint: u32) -> u32 {
        if self.is_border(hint) {
            hint
        } else if hint > 0 && self.is_border(hint - 1) {
            hint - 1
        } else if hint < u32::MAX && self.is_border(hint + 1) {
            hint + 1
        } else {
            self.length()
        }
    }
}

/// Iterator returned by [`LuaTable::iter`].
pub struct TableIter<'a, A: TableAllocator = SystemAllocator> {
    table: &'a LuaTable<A>,
    pos: usize,
}

impl<'a, A: TableAllocator> Iterator for TableIter<'a, A> {
    type Item = (LuaValue, &'a LuaValue);

    fn next(&mut self) -> Option<Self::Item> {
        let (pos, key, value) = self.table.next_at(self.pos)?;
        self.pos = pos + 1;
        Some((key, value))
    }
}

impl<'a, A: TableAllocator> IntoIterator for &'a LuaTable<A> {
    type Item = (LuaValue, &'a LuaValue);
    type IntoIter = TableIter<'a, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
