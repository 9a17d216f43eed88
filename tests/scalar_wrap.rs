use svalue::{compact, layout, Builder, Cursor, CursorEvent, Event, Leaf, Value};
use byteorder::{ByteOrder, LittleEndian};

#[test_log::test]
fn a_root_scalar_is_wrapped_in_a_scalar_array() -> svalue::Result<()> {
    let mut builder = Builder::new();
    builder.push(Event::BeginArray { is_scalar: true })?;
    builder.push(Event::Elem(Value::String(b"hi".to_vec())))?;
    builder.push(Event::EndArray)?;

    let container = compact(&builder.finish()?)?;
    let header = LittleEndian::read_u32(&container.as_bytes()[0..4]);
    assert!(layout::header_is_array(header));
    assert!(layout::header_is_scalar(header));
    assert_eq!(layout::header_count(header), 1);

    let mut cursor = Cursor::new(container.as_ref(), false);
    assert!(matches!(
        cursor.next(),
        Some(CursorEvent::BeginArray { count: 1, is_scalar: true })
    ));
    assert!(matches!(cursor.next(), Some(CursorEvent::Elem(Leaf::String(b"hi")))));
    assert!(matches!(cursor.next(), Some(CursorEvent::EndArray)));
    assert!(cursor.next().is_none());
    Ok(())
}
