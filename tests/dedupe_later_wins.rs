use svalue::{compact, Builder, Event, Value};

#[test_log::test]
fn duplicate_keys_keep_the_last_pushed_value() -> svalue::Result<()> {
    let mut builder = Builder::new();
    builder.push(Event::BeginObject)?;
    builder.push(Event::Key(b"k".to_vec()))?;
    builder.push(Event::Value(Value::Numeric(b"1".to_vec())))?;
    builder.push(Event::Key(b"k".to_vec()))?;
    builder.push(Event::Value(Value::Numeric(b"2".to_vec())))?;
    builder.push(Event::EndObject)?;

    let tree = builder.finish()?;
    match &tree {
        Value::Object { pairs, .. } => {
            assert_eq!(pairs.len(), 1);
            assert_eq!(pairs[0].value, Value::Numeric(b"2".to_vec()));
        }
        _ => panic!("expected object"),
    }

    let container = compact(&tree)?;
    let resolver = svalue::ResolverCache::new();
    let mut lowbound = 0;
    let found = svalue::find_in_container(
        container.as_ref(),
        svalue::Leaf::String(b"k"),
        &mut lowbound,
        &resolver,
    );
    assert_eq!(found, Some(svalue::Leaf::Numeric(b"2")));
    Ok(())
}
