//! Property-based tests for the codec laws.

use fixedfield::{Field, ReadError, Record, RecordLayout, Schema, Value, WriteError};
use proptest::prelude::*;

fn single(field: Field) -> Schema {
    Schema::compile(&RecordLayout::new("T").field(field)).unwrap()
}

fn round_trip(schema: &Schema, value: Value) -> Value {
    let mut record = Record::new("T");
    record.insert("V", value);

    let data = schema.marshal(&record).unwrap();
    assert_eq!(data.len(), schema.size());
    schema.unmarshal(&data).unwrap().get("V").cloned().unwrap()
}

fn arb_width() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(2), Just(4), Just(8)]
}

fn arb_order() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("be"), Just("le")]
}

proptest! {
    #[test]
    fn binary_signed_round_trip(width in arb_width(), order in arb_order(), raw in any::<i64>()) {
        // An arithmetic shift keeps the value inside the width's range.
        let value = raw >> (64 - 8 * width);
        let schema = single(
            Field::new::<i64>("V").length(&width.to_string()).encoding(order),
        );

        prop_assert_eq!(round_trip(&schema, Value::Int(value)), Value::Int(value));
    }

    #[test]
    fn binary_unsigned_round_trip(width in arb_width(), order in arb_order(), raw in any::<u64>()) {
        let value = raw >> (64 - 8 * width);
        let schema = single(
            Field::new::<u64>("V").length(&width.to_string()).encoding(order),
        );

        prop_assert_eq!(round_trip(&schema, Value::UInt(value)), Value::UInt(value));
    }

    #[test]
    fn binary_float_round_trip(order in arb_order(), double in any::<f64>(), single_value in any::<f32>()) {
        let schema = single(Field::new::<f64>("V").length("8").encoding(order));
        let Value::Float64(decoded) = round_trip(&schema, Value::Float64(double)) else {
            panic!("expected float64");
        };
        prop_assert_eq!(decoded.to_bits(), double.to_bits());

        prop_assume!(!single_value.is_nan());
        let schema = single(Field::new::<f32>("V").length("4").encoding(order));
        prop_assert_eq!(
            round_trip(&schema, Value::Float32(single_value)),
            Value::Float32(single_value)
        );
    }

    #[test]
    fn ascii_integer_round_trip(value in any::<i64>(), padding in prop_oneof![Just(" "), Just("0"), Just("*")]) {
        // 20 bytes hold every i64, sign included.
        let schema = single(
            Field::new::<i64>("V").length("20").encoding("ascii").padding(padding),
        );

        prop_assert_eq!(round_trip(&schema, Value::Int(value)), Value::Int(value));
    }

    #[test]
    fn ascii_float_round_trip(value in -1.0e6f64..1.0e6) {
        let schema = single(Field::new::<f64>("V").length("400").encoding("ascii"));

        prop_assert_eq!(round_trip(&schema, Value::Float64(value)), Value::Float64(value));
    }

    #[test]
    fn ascii_overflow_fails(value in any::<i64>(), length in 1usize..20) {
        let text = value.to_string();
        let schema = single(
            Field::new::<i64>("V").length(&length.to_string()).encoding("ascii"),
        );
        let record = Record::new("T").with("V", value);

        let result = schema.marshal(&record);
        if text.len() > length {
            prop_assert_eq!(
                result,
                Err(WriteError::Overflow {
                    record: "T".to_string(),
                    field: "V".to_string(),
                    text,
                    length,
                })
            );
        } else {
            prop_assert_eq!(result.map(|data| data.len()), Ok(length));
        }
    }

    #[test]
    fn short_input_underruns(length in 1usize..64, cut in 0usize..64) {
        prop_assume!(cut < length);
        let schema = single(Field::new::<String>("V").length(&length.to_string()));
        let data = vec![b'x'; cut];

        prop_assert_eq!(
            schema.unmarshal(&data),
            Err(ReadError::Underrun {
                requested: length,
                delivered: cut,
            })
        );
    }

    #[test]
    fn ascii_boolean_membership(byte in any::<u8>()) {
        let schema = single(Field::new::<bool>("V").encoding("ascii").true_chars("jJ"));
        let record = schema.unmarshal(&[byte]).unwrap();

        prop_assert_eq!(
            record.get("V"),
            Some(&Value::Bool(byte == b'j' || byte == b'J'))
        );
    }

    #[test]
    fn binary_boolean_is_nonzero(byte in any::<u8>()) {
        let schema = single(Field::new::<bool>("V").encoding("le"));
        let record = schema.unmarshal(&[byte]).unwrap();

        prop_assert_eq!(record.get("V"), Some(&Value::Bool(byte != 0)));
    }
}
