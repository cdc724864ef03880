use crate::{
    LuaResult, LuaValue,
    gc::{TableAllocator, alloc_copy, alloc_slots, free_slots, grow_slots},
};

/// Array part: slot `i` holds the value of integer key `i`, `Nil` when absent.
#[derive(Default)]
pub struct LuaValueArray {
    pub(crate) array: Vec<LuaValue>,
}

impl LuaValueArray {
    pub fn new<A: TableAllocator>(alloc: &mut A, asize: u32) -> LuaResult<Self> {
        Ok(Self {
            array: alloc_slots(alloc, asize as usize, LuaValue::nil())?,
        })
    }

    #[inline(always)]
    pub fn asize(&self) -> u32 {
        self.array.len() as u32
    }

    #[inline(always)]
    pub fn get(&self, index: u32) -> Option<&LuaValue> {
        match self.array.get(index as usize) {
            Some(v) if !v.is_nil() => Some(v),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn is_live(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Store into an in-range slot, returning the previous content.
    #[inline(always)]
    pub fn replace(&mut self, index: u32, value: LuaValue) -> LuaValue {
        std::mem::replace(&mut self.array[index as usize], value)
    }

    /// Geometric growth for appends at `asize`; new slots are `Nil`.
    pub fn grow<A: TableAllocator>(&mut self, alloc: &mut A, new_asize: u32) -> LuaResult<()> {
        grow_slots(alloc, &mut self.array, new_asize as usize, LuaValue::nil())
    }

    pub fn clear(&mut self) {
        self.array.fill(LuaValue::nil());
    }

    pub fn live_count(&self) -> u32 {
        self.array.iter().filter(|v| !v.is_nil()).count() as u32
    }

    /// First live slot at or after `from`.
    pub fn next_live(&self, from: u32) -> Option<(u32, &LuaValue)> {
        self.array
            .iter()
            .enumerate()
            .skip(from as usize)
            .find(|(_, v)| !v.is_nil())
            .map(|(i, v)| (i as u32, v))
    }

    pub(crate) fn try_clone<A: TableAllocator>(&self, alloc: &mut A) -> LuaResult<Self> {
        Ok(Self {
            array: alloc_copy(alloc, &self.array)?,
        })
    }

    /// Report this buffer as freed; the storage itself goes with `self`.
    pub(crate) fn release<A: TableAllocator>(&self, alloc: &mut A) {
        free_slots::<LuaValue, A>(alloc, self.array.len());
    }
}
