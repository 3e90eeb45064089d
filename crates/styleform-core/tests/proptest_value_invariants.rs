#![forbid(unsafe_code)]

//! Property tests for the value model.
//!
//! Validates:
//! - Clamped doubles are always inside `[min, max]`.
//! - Coercion to a declared type is idempotent.
//! - Colour text is canonical regardless of input hex case.
//! - Literal constants and literal expressions compare equal by display.

use proptest::prelude::*;

use styleform_core::{Colour, DataType, Expr, NumericConfig, Scalar, ValueModel};

fn numeric_scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<i32>().prop_map(|i| Scalar::Integer(i64::from(i))),
        (-1.0e6f64..1.0e6).prop_map(Scalar::Double),
        (-1000i32..1000).prop_map(|i| Scalar::String(i.to_string())),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn clamped_doubles_stay_in_range(
        a in -1.0e4f64..1.0e4,
        b in -1.0e4f64..1.0e4,
        value in -1.0e6f64..1.0e6,
    ) {
        let config = NumericConfig::new(a, b, 1.0);
        match config.apply(Scalar::Double(value)) {
            Scalar::Double(d) => prop_assert!(d >= config.min() && d <= config.max()),
            other => prop_assert!(false, "unexpected {other:?}"),
        }
    }

    #[test]
    fn coercion_is_idempotent(
        raw in numeric_scalar(),
        target in prop_oneof![Just(DataType::Integer), Just(DataType::Double), Just(DataType::String)],
    ) {
        let once = target.coerce(raw).unwrap();
        let twice = target.coerce(once.clone()).unwrap();
        prop_assert_eq!(once.data_type(), target);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn colour_text_is_canonical(r in any::<u8>(), g in any::<u8>(), b in any::<u8>(), lower in any::<bool>()) {
        let upper = format!("#{r:02X}{g:02X}{b:02X}");
        let input = if lower { upper.to_lowercase() } else { upper.clone() };
        let colour: Colour = input.parse().unwrap();
        prop_assert_eq!(colour.to_string(), upper);
        prop_assert_eq!(colour.a, 255);
    }

    #[test]
    fn literal_expression_matches_constant(value in -1000i64..1000) {
        let constant = ValueModel::Constant(Scalar::Integer(value));
        let from_expr = ValueModel::from_model_expression(&Expr::literal(value)).unwrap();
        prop_assert!(constant.same_display(&from_expr));
        prop_assert_eq!(
            constant.to_emitted_expression(DataType::Integer),
            Expr::literal(value)
        );
    }
}
