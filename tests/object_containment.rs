use svalue::{compact, deep_contains, Builder, Event, ResolverCache, Value};

fn build(events: Vec<Event>) -> svalue::Container {
    let mut builder = Builder::new();
    for event in events {
        builder.push(event).unwrap();
    }
    compact(&builder.finish().unwrap()).unwrap()
}

#[test_log::test]
fn an_object_contains_a_subset_with_a_nested_array_match() {
    // a = {"x": 1, "y": [1, 2, 3]}
    let a = build(vec![
        Event::BeginObject,
        Event::Key(b"x".to_vec()),
        Event::Value(Value::Numeric(b"1".to_vec())),
        Event::Key(b"y".to_vec()),
        Event::BeginArray { is_scalar: false },
        Event::Elem(Value::Numeric(b"1".to_vec())),
        Event::Elem(Value::Numeric(b"2".to_vec())),
        Event::Elem(Value::Numeric(b"3".to_vec())),
        Event::EndArray,
        Event::EndObject,
    ]);

    // b = {"y": [2, 1]}
    let b = build(vec![
        Event::BeginObject,
        Event::Key(b"y".to_vec()),
        Event::BeginArray { is_scalar: false },
        Event::Elem(Value::Numeric(b"2".to_vec())),
        Event::Elem(Value::Numeric(b"1".to_vec())),
        Event::EndArray,
        Event::EndObject,
    ]);

    let resolver = ResolverCache::new();
    assert!(deep_contains(a.as_ref(), b.as_ref(), &resolver));

    // Containment is not symmetric: b does not contain a's missing "x" key.
    assert!(!deep_contains(b.as_ref(), a.as_ref(), &resolver));
}

#[test_log::test]
fn an_object_always_contains_itself_and_the_empty_object() {
    let a = build(vec![
        Event::BeginObject,
        Event::Key(b"x".to_vec()),
        Event::Value(Value::Bool(true)),
        Event::EndObject,
    ]);
    let empty = build(vec![Event::BeginObject, Event::EndObject]);

    let resolver = ResolverCache::new();
    assert!(deep_contains(a.as_ref(), a.as_ref(), &resolver));
    assert!(deep_contains(a.as_ref(), empty.as_ref(), &resolver));
}
