use crate::{
    LuaResult, LuaValue,
    gc::{TableAllocator, alloc_copy, alloc_slots, free_slots},
    lua_table::key_slot::hash_key,
};

/// Hash part - chained scatter table with Brent's variation
///
/// All nodes live in one power-of-two `Vec`; collision chains are `next`
/// indices into that same buffer, so a collision never allocates.
///
/// Invariants:
/// - if a key is not in its main position, the key occupying that main
///   position is in its own main position (relocation keeps chain heads home)
/// - a free node has a nil key and no `next`
/// - a dead node keeps its key and chain link and stores a nil value
/// - the node buffer never grows here; `Full` is reported to the caller
pub struct LuaHashTable {
    nodes: Vec<Node>,
    /// Free scan cursor: nodes below it are candidates, scanned backwards.
    last_free: u32,
}

#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) key: LuaValue,
    pub(crate) value: LuaValue,
    pub(crate) next: Option<u32>,
}

impl Node {
    const EMPTY: Node = Node {
        key: LuaValue::Nil,
        value: LuaValue::Nil,
        next: None,
    };

    #[inline(always)]
    pub(crate) fn is_free(&self) -> bool {
        self.key.is_nil()
    }

    #[inline(always)]
    pub(crate) fn is_live(&self) -> bool {
        !self.value.is_nil()
    }

    #[inline(always)]
    pub(crate) fn is_dead(&self) -> bool {
        !self.key.is_nil() && self.value.is_nil()
    }
}

pub(crate) enum LuaInsertResult {
    Inserted,
    /// No free node left; the table must rehash and retry.
    Full(LuaValue, LuaValue),
}

impl LuaHashTable {
    /// `2^hbits` nodes; `hbits == 0` builds the one-node sentinel that
    /// stands for "no hash part" and never accepts a key.
    pub fn new<A: TableAllocator>(alloc: &mut A, hbits: u32) -> LuaResult<Self> {
        let size = 1usize << hbits;
        Ok(Self {
            nodes: alloc_slots(alloc, size, Node::EMPTY)?,
            last_free: size as u32,
        })
    }

    #[inline(always)]
    pub fn hmask(&self) -> u32 {
        (self.nodes.len() - 1) as u32
    }

    /// Usable node count, 0 for the sentinel.
    #[inline(always)]
    pub fn capacity(&self) -> u32 {
        if self.hmask() == 0 {
            0
        } else {
            self.nodes.len() as u32
        }
    }

    #[inline(always)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline(always)]
    pub(crate) fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    #[inline(always)]
    fn main_position(&self, hash: u32) -> usize {
        (hash & self.hmask()) as usize
    }

    /// Node holding `key`, live or dead.
    #[inline(always)]
    pub(crate) fn find(&self, key: &LuaValue, hash: u32) -> Option<usize> {
        self.find_with(hash, |k| k.raw_equal(key))
    }

    /// Walk the chain of `hash` until `matches` accepts a node key.
    #[inline(always)]
    pub(crate) fn find_with(&self, hash: u32, matches: impl Fn(&LuaValue) -> bool) -> Option<usize> {
        if self.hmask() == 0 {
            return None;
        }
        let mut idx = self.main_position(hash);
        loop {
            let node = &self.nodes[idx];
            if !node.is_free() && matches(&node.key) {
                return Some(idx);
            }
            idx = node.next? as usize;
        }
    }

    #[inline(always)]
    pub fn get(&self, key: &LuaValue, hash: u32) -> Option<&LuaValue> {
        let idx = self.find(key, hash)?;
        let node = &self.nodes[idx];
        if node.is_live() { Some(&node.value) } else { None }
    }

    /// Overwrite the value of an existing (possibly dead) node.
    #[inline(always)]
    pub(crate) fn replace_value(&mut self, idx: usize, value: LuaValue) -> LuaValue {
        std::mem::replace(&mut self.nodes[idx].value, value)
    }

    /// Backward scan for a node with a nil key.
    fn get_free_pos(&mut self) -> Option<usize> {
        while self.last_free > 0 {
            self.last_free -= 1;
            if self.nodes[self.last_free as usize].is_free() {
                return Some(self.last_free as usize);
            }
        }
        None
    }

    /// Insert a key known to be absent (not even dead).
    pub(crate) fn insert_new_key(&mut self, key: LuaValue, hash: u32, value: LuaValue) -> LuaInsertResult {
        if self.hmask() == 0 {
            return LuaInsertResult::Full(key, value);
        }
        let main_pos = self.main_position(hash);

        if self.nodes[main_pos].is_free() {
            self.nodes[main_pos] = Node {
                key,
                value,
                next: None,
            };
            return LuaInsertResult::Inserted;
        }

        let Some(free_pos) = self.get_free_pos() else {
            return LuaInsertResult::Full(key, value);
        };

        let other_main_pos = self.main_position(hash_key(&self.nodes[main_pos].key));
        if other_main_pos != main_pos {
            // The occupant is chained from elsewhere: move it to the free node
            // and give its slot to the new key.
            let mut prev = other_main_pos;
            while let Some(next) = self.nodes[prev].next {
                if next as usize == main_pos {
                    break;
                }
                prev = next as usize;
            }
            debug_assert_eq!(self.nodes[prev].next, Some(main_pos as u32));
            self.nodes[prev].next = Some(free_pos as u32);
            self.nodes[free_pos] = std::mem::replace(
                &mut self.nodes[main_pos],
                Node {
                    key,
                    value,
                    next: None,
                },
            );
        } else {
            // Occupant is home: link the new key right behind the chain head.
            self.nodes[free_pos] = Node {
                key,
                value,
                next: self.nodes[main_pos].next,
            };
            self.nodes[main_pos].next = Some(free_pos as u32);
        }
        LuaInsertResult::Inserted
    }

    /// Kill the node holding `key`. The key and its chain link stay in place
    /// until the next rebuild.
    pub fn remove(&mut self, key: &LuaValue, hash: u32) -> Option<LuaValue> {
        let idx = self.find(key, hash)?;
        let old = self.replace_value(idx, LuaValue::nil());
        if old.is_nil() { None } else { Some(old) }
    }

    /// First live node at or after `from`.
    pub(crate) fn next_live(&self, from: usize) -> Option<(usize, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, node)| node.is_live())
    }

    pub fn live_count(&self) -> u32 {
        self.nodes.iter().filter(|node| node.is_live()).count() as u32
    }

    pub fn dead_count(&self) -> u32 {
        self.nodes.iter().filter(|node| node.is_dead()).count() as u32
    }

    pub fn clear(&mut self) {
        self.nodes.fill(Node::EMPTY);
        self.last_free = self.nodes.len() as u32;
    }

    pub(crate) fn try_clone<A: TableAllocator>(&self, alloc: &mut A) -> LuaResult<Self> {
        Ok(Self {
            nodes: alloc_copy(alloc, &self.nodes)?,
            last_free: self.last_free,
        })
    }

    /// Report this buffer as freed; the storage itself goes with `self`.
    pub(crate) fn release<A: TableAllocator>(&self, alloc: &mut A) {
        free_slots::<Node, A>(alloc, self.nodes.len());
    }
}
