//! Transactional editing
//!
//! While a transaction is open, writes are buffered instead of stored and reads
//! see the buffered values. Committing replays the buffer through the normal
//! set pipeline one write at a time; a failure part-way leaves the earlier
//! writes in place.

use crate::{call_flag, call_unit, capability};
use aspectconf_core::{
    order, ConfigObject, Engine, Extension, GetContext, Result, SetContext, Value,
};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, warn};

/// Method opening a transaction
pub const START_TRANSACTION: &str = "StartTransaction";
/// Method replaying the buffer into the store
pub const COMMIT_TRANSACTION: &str = "CommitTransaction";
/// Method discarding the buffer
pub const ROLLBACK_TRANSACTION: &str = "RollbackTransaction";
/// Method reporting buffered writes
pub const IS_TRANSACTION_DIRTY: &str = "IsTransactionDirty";
/// Method reporting whether a transaction is open
pub const IS_IN_TRANSACTION: &str = "IsInTransaction";

#[derive(Debug, Default)]
struct TransactionState {
    active: bool,
    /// Declared name and coerced value, in first-write order
    buffer: Vec<(String, Value)>,
}

impl TransactionState {
    fn buffered(&self, name: &str) -> Option<&Value> {
        self.buffer
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    fn buffer_value(&mut self, name: &str, value: Value) -> Option<Value> {
        match self
            .buffer
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.buffer.push((name.to_string(), value));
                None
            }
        }
    }
}

/// Buffers writes between start and commit/rollback
#[derive(Debug, Default)]
pub struct Transaction {
    state: Mutex<TransactionState>,
}

impl Transaction {
    /// Create the extension with no transaction open
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transaction is open
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Whether the open transaction holds buffered writes
    pub fn is_dirty(&self) -> bool {
        let state = self.state.lock();
        state.active && !state.buffer.is_empty()
    }

    fn on_get(&self, ctx: &mut GetContext) -> Result<()> {
        let state = self.state.lock();
        if !state.active {
            return Ok(());
        }
        if let Some(value) = state.buffered(ctx.name()) {
            ctx.value = value.clone();
            ctx.has_value = true;
            ctx.halt();
        }
        Ok(())
    }

    fn on_set(&self, ctx: &mut SetContext) -> Result<()> {
        let mut state = self.state.lock();
        if !state.active {
            return Ok(());
        }
        match ctx.descriptor().coerce(&ctx.new_value) {
            Ok(coerced) => {
                ctx.new_value = coerced.clone();
                ctx.old_value = state.buffer_value(ctx.name(), coerced);
                ctx.halt();
            }
            Err(err) => ctx.fail(err),
        }
        Ok(())
    }

    fn start(&self) {
        let mut state = self.state.lock();
        if state.active {
            warn!("Transaction already in progress; start ignored");
            return;
        }
        debug!("Transaction started");
        state.active = true;
        state.buffer.clear();
    }

    fn commit(&self, engine: &Engine) -> Result<()> {
        let buffer = {
            let mut state = self.state.lock();
            state.active = false;
            std::mem::take(&mut state.buffer)
        };
        debug!("Committing {} buffered writes", buffer.len());
        for (name, value) in buffer {
            engine.set(&name, value)?;
        }
        Ok(())
    }

    fn rollback(&self) {
        let mut state = self.state.lock();
        debug!("Rolling back {} buffered writes", state.buffer.len());
        state.active = false;
        state.buffer.clear();
    }
}

impl Extension for Transaction {
    fn name(&self) -> &str {
        capability::TRANSACTION
    }

    fn attach(self: Arc<Self>, engine: &Engine) -> Result<()> {
        let this = Arc::clone(&self);
        engine.register_get_interceptor(order::TRANSACTION, move |_, ctx| this.on_get(ctx));
        let this = Arc::clone(&self);
        engine.register_set_interceptor(order::TRANSACTION, move |_, ctx| this.on_set(ctx));

        let this = Arc::clone(&self);
        engine.register_method(START_TRANSACTION, move |_, _| {
            this.start();
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(COMMIT_TRANSACTION, move |engine, ctx| {
            if let Err(err) = this.commit(engine) {
                ctx.fail(err);
            }
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(ROLLBACK_TRANSACTION, move |_, _| {
            this.rollback();
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(IS_TRANSACTION_DIRTY, move |_, ctx| {
            ctx.result = Value::Boolean(this.is_dirty());
            Ok(())
        });
        engine.register_method(IS_IN_TRANSACTION, move |_, ctx| {
            ctx.result = Value::Boolean(self.is_active());
            Ok(())
        });
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Transaction methods on any configuration object
pub trait TransactionExt: ConfigObject {
    /// Start buffering writes; ignored if a transaction is already open
    fn start_transaction(&self) -> Result<()> {
        call_unit(self, START_TRANSACTION, vec![])
    }

    /// Replay buffered writes through the set pipeline
    fn commit_transaction(&self) -> Result<()> {
        call_unit(self, COMMIT_TRANSACTION, vec![])
    }

    /// Discard buffered writes
    fn rollback_transaction(&self) -> Result<()> {
        call_unit(self, ROLLBACK_TRANSACTION, vec![])
    }

    /// Whether the open transaction holds buffered writes
    fn is_transaction_dirty(&self) -> Result<bool> {
        call_flag(self, IS_TRANSACTION_DIRTY, vec![])
    }

    /// Whether a transaction is open
    fn is_in_transaction(&self) -> Result<bool> {
        call_flag(self, IS_IN_TRANSACTION, vec![])
    }
}

impl<T: ConfigObject + ?Sized> TransactionExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write_protect::{WriteProtect, WRITE_PROTECT};
    use aspectconf_core::metadata::{resolve, skip_infrastructure};
    use aspectconf_core::{ContractDefinition, Error, PropertySpec, ValueType};

    fn engine() -> Engine {
        let contract = ContractDefinition::builder("IPerson")
            .property(PropertySpec::new("Age", ValueType::Integer))
            .property(PropertySpec::new("Name", ValueType::String))
            .build()
            .unwrap();
        let engine = Engine::new(Arc::new(resolve(&contract, &skip_infrastructure)));
        engine.attach(Arc::new(Transaction::new())).unwrap();
        engine
    }

    fn flag(engine: &Engine, method: &str) -> bool {
        engine.invoke(method, vec![]).unwrap() == Value::Boolean(true)
    }

    #[test]
    fn test_buffered_writes_do_not_touch_store() {
        let engine = engine();
        engine.set("Age", 1).unwrap();
        engine.invoke(START_TRANSACTION, vec![]).unwrap();

        let ctx = engine.set("Age", "2").unwrap();
        assert!(!ctx.is_stored());
        assert_eq!(ctx.old_value, None);
        let ctx = engine.set("age", 3).unwrap();
        assert_eq!(ctx.old_value, Some(Value::Integer(2)));
        engine.set("Name", "Robin").unwrap();

        assert_eq!(engine.get_value("Age").unwrap(), Value::Integer(3));
        assert_eq!(engine.properties().get("Age"), Some(&Value::Integer(1)));
        assert!(!engine.has_value("Name"));
        assert!(flag(&engine, IS_TRANSACTION_DIRTY));
    }

    #[test]
    fn test_commit_replays_final_values() {
        let engine = engine();
        engine.invoke(START_TRANSACTION, vec![]).unwrap();
        engine.set("Age", 2).unwrap();
        engine.set("Age", 5).unwrap();
        engine.set("Name", "Robin").unwrap();
        engine.invoke(COMMIT_TRANSACTION, vec![]).unwrap();

        let snapshot = engine.properties();
        assert_eq!(snapshot.get("Age"), Some(&Value::Integer(5)));
        assert_eq!(snapshot.get("Name"), Some(&Value::from("Robin")));
        assert!(!flag(&engine, IS_IN_TRANSACTION));
        assert!(!flag(&engine, IS_TRANSACTION_DIRTY));
    }

    #[test]
    fn test_rollback_restores_prior_state() {
        let engine = engine();
        engine.set("Age", 1).unwrap();
        let before = engine.properties();

        engine.invoke(START_TRANSACTION, vec![]).unwrap();
        engine.set("Age", 2).unwrap();
        engine.set("Name", "x").unwrap();
        engine.invoke(ROLLBACK_TRANSACTION, vec![]).unwrap();

        assert_eq!(engine.properties(), before);
        assert_eq!(engine.get_value("Age").unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_nested_start_is_ignored() {
        let engine = engine();
        engine.invoke(START_TRANSACTION, vec![]).unwrap();
        engine.set("Age", 9).unwrap();
        engine.invoke(START_TRANSACTION, vec![]).unwrap();

        assert!(flag(&engine, IS_TRANSACTION_DIRTY));
        engine.invoke(COMMIT_TRANSACTION, vec![]).unwrap();
        assert_eq!(engine.get_value("Age").unwrap(), Value::Integer(9));
    }

    #[test]
    fn test_conversion_error_surfaces_while_buffering() {
        let engine = engine();
        engine.invoke(START_TRANSACTION, vec![]).unwrap();
        assert!(matches!(
            engine.set("Age", "abc"),
            Err(Error::Conversion { .. })
        ));
        assert!(!flag(&engine, IS_TRANSACTION_DIRTY));
    }

    #[test]
    fn test_commit_stops_at_first_failure() {
        let engine = engine();
        engine.attach(Arc::new(WriteProtect::new())).unwrap();

        engine.invoke(START_TRANSACTION, vec![]).unwrap();
        engine.set("Age", 4).unwrap();
        engine.set("Name", "Robin").unwrap();
        engine
            .invoke(WRITE_PROTECT, vec![Value::from("Name")])
            .unwrap();

        assert!(matches!(
            engine.invoke(COMMIT_TRANSACTION, vec![]),
            Err(Error::WriteProtected(_))
        ));
        assert_eq!(engine.get_value("Age").unwrap(), Value::Integer(4));
        assert!(!engine.has_value("Name"));
    }
}
