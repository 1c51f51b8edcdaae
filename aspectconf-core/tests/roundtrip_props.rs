//! Property-based tests for the set/get contract of the engine

use aspectconf_core::metadata::{resolve, skip_infrastructure};
use aspectconf_core::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn engine() -> Engine {
    let contract = ContractDefinition::builder("IProps")
        .property(PropertySpec::new("Count", ValueType::Integer))
        .property(PropertySpec::new("Ratio", ValueType::Float))
        .property(PropertySpec::new("Label", ValueType::String))
        .property(PropertySpec::new("Enabled", ValueType::Boolean))
        .build()
        .unwrap();
    Engine::new(Arc::new(resolve(&contract, &skip_infrastructure)))
}

proptest! {
    #[test]
    fn integer_round_trip(n in any::<i64>()) {
        let engine = engine();
        engine.set("Count", n).unwrap();
        prop_assert_eq!(engine.get_value("Count").unwrap(), Value::Integer(n));
    }

    #[test]
    fn integer_text_is_coerced(n in any::<i64>()) {
        let engine = engine();
        engine.set("count", n.to_string()).unwrap();
        prop_assert_eq!(engine.get_value("COUNT").unwrap(), Value::Integer(n));
    }

    #[test]
    fn float_round_trip(x in -1.0e12f64..1.0e12f64) {
        let engine = engine();
        engine.set("Ratio", x).unwrap();
        prop_assert_eq!(engine.get_value("Ratio").unwrap(), Value::Float(x));
    }

    #[test]
    fn string_round_trip(s in ".*") {
        let engine = engine();
        engine.set("Label", s.clone()).unwrap();
        prop_assert_eq!(engine.get_value("Label").unwrap(), Value::String(s));
    }

    #[test]
    fn last_write_wins(values in proptest::collection::vec(any::<bool>(), 1..20)) {
        let engine = engine();
        for v in &values {
            engine.set("Enabled", *v).unwrap();
        }
        prop_assert_eq!(
            engine.get_value("Enabled").unwrap(),
            Value::Boolean(*values.last().unwrap())
        );
    }

    #[test]
    fn vetoed_writes_never_reach_the_store(n in any::<i64>()) {
        let engine = engine();
        engine.register_set_interceptor(-100, |_, ctx| {
            ctx.halt();
            Ok(())
        });
        engine.set("Count", n).unwrap();
        prop_assert!(engine.properties().is_empty());
    }
}
