//! One configuration object shared across threads

use aspectconf_builder::{ConfigBuilder, ExtensionRegistry};
use aspectconf_core::prelude::*;
use aspectconf_extensions::contracts::*;
use aspectconf_extensions::{HasChangesExt, TransactionExt, WriteProtectExt};
use std::sync::Arc;
use std::thread;

const WRITERS: usize = 4;
const WRITES: i64 = 200;

fn counter(index: usize) -> String {
    format!("Counter{}", index)
}

fn shared_config() -> ContractProxy {
    let builder = (0..WRITERS).fold(
        ContractDefinition::builder("ICounters")
            .extends(default_value_contract())
            .extends(write_protect_contract())
            .extends(transaction_contract())
            .extends(has_changes_contract())
            .property(PropertySpec::new("Locked", ValueType::Integer).default(0)),
        |builder, i| builder.property(PropertySpec::new(counter(i), ValueType::Integer).default(0)),
    );
    let definition = builder.build().unwrap();
    let registry = ExtensionRegistry::with_defaults();
    ConfigBuilder::new(&registry)
        .build_definition(&definition)
        .unwrap()
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_engine_and_proxy_are_send_sync() {
    assert_send_sync::<Engine>();
    assert_send_sync::<ContractProxy>();
    assert_send_sync::<Arc<Engine>>();
}

#[test]
fn test_concurrent_writes_and_transactions() {
    let config = shared_config();

    thread::scope(|scope| {
        for i in 0..WRITERS {
            let config = &config;
            scope.spawn(move || {
                let name = counter(i);
                for n in 1..=WRITES {
                    config.set_item(&name, n).unwrap();
                }
            });
        }

        scope.spawn(|| {
            for _ in 0..50 {
                config.start_transaction().unwrap();
                config.commit_transaction().unwrap();
            }
        });

        scope.spawn(|| {
            for _ in 0..50 {
                config.write_protect("Locked").unwrap();
                assert!(config.is_write_protected("Locked").unwrap());
                assert!(config.set_item("Locked", 1).is_err());
                config.disable_write_protect("Locked").unwrap();
            }
        });
    });

    assert!(!config.is_in_transaction().unwrap());
    assert!(!config.is_write_protected("Locked").unwrap());
    assert_eq!(config.get_item("Locked").unwrap(), Value::Integer(0));
    for i in 0..WRITERS {
        match config.get_item(&counter(i)).unwrap() {
            Value::Integer(n) => assert!((1..=WRITES).contains(&n)),
            other => panic!("Expected integer, got {:?}", other),
        }
        assert!(config.is_changed(&counter(i)).unwrap());
    }
}

#[test]
fn test_buffered_writes_from_other_threads_commit_together() {
    let config = shared_config();
    config.start_transaction().unwrap();

    thread::scope(|scope| {
        for i in 0..WRITERS {
            let config = &config;
            scope.spawn(move || config.set_item(&counter(i), i as i64 + 10).unwrap());
        }
    });

    assert!(config.is_transaction_dirty().unwrap());
    assert_eq!(config.engine().properties().get("Counter0"), Some(&Value::Integer(0)));

    config.commit_transaction().unwrap();
    for i in 0..WRITERS {
        assert_eq!(
            config.get_item(&counter(i)).unwrap(),
            Value::Integer(i as i64 + 10)
        );
    }
}
