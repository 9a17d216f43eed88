use rand::seq::IndexedRandom;
use rand::Rng;
use svalue::{compact, Builder, Cursor, CursorEvent, Event, Leaf, Value};

/// Builds a random flat object of up to `max_keys` numeric-valued entries
/// with possibly-colliding keys (to exercise the dedupe-later-wins path).
fn random_pushes(rng: &mut impl Rng, max_keys: usize) -> Vec<(Vec<u8>, i64)> {
    let alphabet = [b'a', b'b', b'c', b'd'];
    let n = rng.random_range(1..=max_keys);
    (0..n)
        .map(|_| {
            let key_len = rng.random_range(1..=2usize);
            let key: Vec<u8> = (0..key_len)
                .map(|_| *alphabet.choose(rng).unwrap())
                .collect();
            let value = rng.random_range(-100..100);
            (key, value)
        })
        .collect()
}

/// Pushes `pushes` through the builder, compacts, and checks that the
/// forward cursor emits keys in strictly sorted order holding the
/// last-pushed value for each.
#[test_log::test]
fn random_objects_round_trip_sorted_and_deduped() -> svalue::Result<()> {
    let mut rng = rand::rng();

    for _ in 0..200 {
        let pushes = random_pushes(&mut rng, 8);

        let mut expected = std::collections::BTreeMap::new();
        for (k, v) in &pushes {
            expected.insert(k.clone(), *v);
        }

        let mut builder = Builder::new();
        builder.push(Event::BeginObject)?;
        for (k, v) in &pushes {
            builder.push(Event::Key(k.clone()))?;
            builder.push(Event::Value(Value::Numeric(v.to_be_bytes().to_vec())))?;
        }
        builder.push(Event::EndObject)?;

        let container = compact(&builder.finish()?)?;

        let mut cursor = Cursor::new(container.as_ref(), false);
        assert!(matches!(cursor.next(), Some(CursorEvent::BeginObject { .. })));

        let mut seen = Vec::new();
        loop {
            match cursor.next() {
                Some(CursorEvent::Key(k)) => {
                    let value = match cursor.next() {
                        Some(CursorEvent::Value(Leaf::Numeric(bytes))) => {
                            i64::from_be_bytes(bytes.try_into().expect("8-byte payload"))
                        }
                        other => panic!("expected a numeric value, got {other:?}"),
                    };
                    seen.push((k.to_vec(), value));
                }
                Some(CursorEvent::EndObject) => break,
                other => panic!("unexpected event: {other:?}"),
            }
        }

        let mut in_sorted_order = seen.clone();
        in_sorted_order.sort_by(|(ka, _), (kb, _)| (ka.len(), ka).cmp(&(kb.len(), kb)));
        assert_eq!(seen, in_sorted_order, "cursor must emit keys in sorted order");

        let seen_map: std::collections::BTreeMap<_, _> = seen.into_iter().collect();
        assert_eq!(seen_map, expected, "dedupe must keep the last-pushed value per key");
    }

    Ok(())
}
