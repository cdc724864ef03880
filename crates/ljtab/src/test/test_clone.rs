// Tests for table duplication
use crate::*;

fn sample(interner: &mut StringInterner) -> LuaTable {
    let mut t = LuaTable::new(0, 0);
    for i in 0..10 {
        t.set_int(i, LuaValue::integer(i)).unwrap();
    }
    t.set_str(interner.intern("name"), LuaValue::string(interner.intern("value")))
        .unwrap();
    t.set(
        LuaValue::object(GcRef::Table(TableId(3))),
        LuaValue::object(GcRef::Function(FunctionId(4))),
    )
    .unwrap();
    t
}

#[test]
fn test_clone_is_independent() {
    let mut interner = StringInterner::new();
    let original = sample(&mut interner);
    let mut copy = original.clone();

    copy.set_int(0, LuaValue::boolean(false)).unwrap();
    copy.remove(&LuaValue::integer(1));
    for i in 0..200 {
        copy.set_int(10_000 + i, LuaValue::integer(i)).unwrap();
    }

    assert_eq!(original.key_count(), 12);
    assert_eq!(original.get_int(0), Some(&LuaValue::integer(0)));
    assert_eq!(original.get_int(1), Some(&LuaValue::integer(1)));
    assert_eq!(original.get_int(10_000), None);
    assert_eq!(copy.key_count(), 211);
}

#[test]
fn test_clone_keeps_shape_and_order() {
    let mut interner = StringInterner::new();
    let original = sample(&mut interner);
    let copy = original.try_clone().unwrap();
    assert_eq!(copy.stats(), original.stats());

    let a: Vec<(LuaValue, LuaValue)> = original.iter().map(|(k, v)| (k, v.clone())).collect();
    let b: Vec<(LuaValue, LuaValue)> = copy.iter().map(|(k, v)| (k, v.clone())).collect();
    assert_eq!(a, b);
}

#[test]
fn test_clone_shares_references() {
    let mut interner = StringInterner::new();
    let original = sample(&mut interner);
    let copy = original.clone();
    let key = LuaValue::object(GcRef::Table(TableId(3)));
    assert_eq!(
        copy.get(&key).and_then(|v| v.as_object()),
        Some(GcRef::Function(FunctionId(4)))
    );
    let name = interner.intern("name");
    assert_eq!(copy.get_str(&name).and_then(|v| v.as_str()), Some("value"));
}

#[test]
fn test_clone_keeps_dead_key_positions() {
    let mut t = LuaTable::new(0, 8);
    for i in 0..5 {
        t.set_int(100 + i, LuaValue::integer(i)).unwrap();
    }
    let (first, _) = t.next(None).unwrap();
    t.remove(&first);

    let copy = t.clone();
    let mut rest = 0;
    let mut key = Some(first);
    while let Some(k) = copy.next(key.as_ref()).map(|(k, _)| k) {
        rest += 1;
        key = Some(k);
    }
    assert_eq!(rest, 4);
}
