use ahash::RandomState;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
struct LuaString {
    sid: u32,
    text: SmolStr,
}

/// Handle to an interned string. Cloning bumps a reference count.
#[derive(Clone)]
pub struct LuaStr(Rc<LuaString>);

impl LuaStr {
    /// Stable id assigned at interning time; doubles as the table hash.
    #[inline(always)]
    pub fn sid(&self) -> u32 {
        self.0.sid
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0.text
    }
}

impl PartialEq for LuaStr {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || (self.0.sid == other.0.sid && self.0.text == other.0.text)
    }
}

impl Eq for LuaStr {}

impl std::fmt::Debug for LuaStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}#{}", self.as_str(), self.sid())
    }
}

/// String interner - same content always yields the same `LuaStr`
/// - content hash via ahash, collisions resolved by comparing text
/// - ids are handed out sequentially so `sid & hmask` spreads well
pub struct StringInterner {
    map: HashMap<u64, Vec<LuaStr>, RandomState>,
    hashbuilder: RandomState,
    next_sid: u32,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(256, RandomState::new()),
            hashbuilder: RandomState::new(),
            next_sid: 0,
        }
    }

    pub fn intern(&mut self, s: &str) -> LuaStr {
        let hash = self.hashbuilder.hash_one(s);

        if let Some(found) = self
            .map
            .get(&hash)
            .and_then(|strs| strs.iter().find(|ls| ls.as_str() == s))
        {
            return found.clone();
        }

        let ls = LuaStr(Rc::new(LuaString {
            sid: self.next_sid,
            text: SmolStr::new(s),
        }));
        self.next_sid = self.next_sid.wrapping_add(1);
        self.map.entry(hash).or_default().push(ls.clone());
        ls
    }

    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
