//! Change tracking

use crate::{call_flag, call_unit, capability};
use aspectconf_core::{
    order, ConfigObject, ConfigValue, Engine, Error, Extension, Result, SetContext, Value,
};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

/// Method enabling tracking
pub const TRACK_CHANGES: &str = "TrackChanges";
/// Method disabling tracking
pub const DO_NOT_TRACK_CHANGES: &str = "DoNotTrackChanges";
/// Method reporting whether anything changed
pub const HAS_CHANGES: &str = "HasChanges";
/// Method clearing the changed set
pub const RESET_HAS_CHANGES: &str = "ResetHasChanges";
/// Method listing the changed properties
pub const CHANGES: &str = "Changes";
/// Method reporting whether one property changed
pub const IS_CHANGED: &str = "IsChanged";

#[derive(Debug)]
struct ChangeState {
    tracking: bool,
    changed: Vec<String>,
}

/// Records which properties were written with a different value.
///
/// Tracking is on from the start. Only writes that reach the store count;
/// buffered or rejected writes do not.
#[derive(Debug)]
pub struct HasChanges {
    state: Mutex<ChangeState>,
}

impl Default for HasChanges {
    fn default() -> Self {
        Self {
            state: Mutex::new(ChangeState {
                tracking: true,
                changed: Vec::new(),
            }),
        }
    }
}

impl HasChanges {
    /// Create the extension with tracking enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Changed property names in first-change order
    pub fn changes(&self) -> Vec<String> {
        self.state.lock().changed.clone()
    }

    /// Whether `name` changed since the last reset
    pub fn is_changed(&self, name: &str) -> bool {
        self.state
            .lock()
            .changed
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name))
    }

    fn on_set(&self, ctx: &mut SetContext) -> Result<()> {
        if !ctx.is_stored() || !ctx.is_change() {
            return Ok(());
        }
        let mut state = self.state.lock();
        if state.tracking && !state.changed.iter().any(|n| n.eq_ignore_ascii_case(ctx.name())) {
            state.changed.push(ctx.name().to_string());
        }
        Ok(())
    }
}

impl Extension for HasChanges {
    fn name(&self) -> &str {
        capability::HAS_CHANGES
    }

    fn attach(self: Arc<Self>, engine: &Engine) -> Result<()> {
        let this = Arc::clone(&self);
        engine.register_set_interceptor(order::AFTER_STORE, move |_, ctx| this.on_set(ctx));

        let this = Arc::clone(&self);
        engine.register_method(TRACK_CHANGES, move |_, _| {
            this.state.lock().tracking = true;
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(DO_NOT_TRACK_CHANGES, move |_, _| {
            this.state.lock().tracking = false;
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(HAS_CHANGES, move |_, ctx| {
            ctx.result = Value::Boolean(!this.state.lock().changed.is_empty());
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(RESET_HAS_CHANGES, move |_, _| {
            this.state.lock().changed.clear();
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(CHANGES, move |_, ctx| {
            ctx.result = this.changes().into_value();
            Ok(())
        });
        engine.register_method(IS_CHANGED, move |_, ctx| {
            let changed = self.is_changed(ctx.str_arg(0)?);
            ctx.result = Value::Boolean(changed);
            Ok(())
        });
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Change-tracking methods on any configuration object
pub trait HasChangesExt: ConfigObject {
    /// Enable tracking
    fn track_changes(&self) -> Result<()> {
        call_unit(self, TRACK_CHANGES, vec![])
    }

    /// Disable tracking; already recorded changes are kept
    fn do_not_track_changes(&self) -> Result<()> {
        call_unit(self, DO_NOT_TRACK_CHANGES, vec![])
    }

    /// Whether any property changed since the last reset
    fn has_changes(&self) -> Result<bool> {
        call_flag(self, HAS_CHANGES, vec![])
    }

    /// Forget recorded changes
    fn reset_has_changes(&self) -> Result<()> {
        call_unit(self, RESET_HAS_CHANGES, vec![])
    }

    /// Changed property names in first-change order
    fn changes(&self) -> Result<Vec<String>> {
        let value = self.call(CHANGES, vec![])?;
        Vec::<String>::from_value(value).map_err(|e| Error::conversion(CHANGES, e))
    }

    /// Whether `name` changed since the last reset
    fn is_changed(&self, name: &str) -> Result<bool> {
        call_flag(self, IS_CHANGED, vec![Value::from(name)])
    }
}

impl<T: ConfigObject + ?Sized> HasChangesExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Transaction, COMMIT_TRANSACTION, START_TRANSACTION};
    use aspectconf_core::metadata::{resolve, skip_infrastructure};
    use aspectconf_core::{ContractDefinition, PropertySpec, ValueType};

    fn engine() -> (Engine, Arc<HasChanges>) {
        let contract = ContractDefinition::builder("IPerson")
            .property(PropertySpec::new("Age", ValueType::Integer))
            .property(PropertySpec::new("Name", ValueType::String))
            .build()
            .unwrap();
        let engine = Engine::new(Arc::new(resolve(&contract, &skip_infrastructure)));
        let changes = Arc::new(HasChanges::new());
        engine.attach(changes.clone()).unwrap();
        (engine, changes)
    }

    fn flag(engine: &Engine, method: &str) -> bool {
        engine.invoke(method, vec![]).unwrap() == Value::Boolean(true)
    }

    #[test]
    fn test_same_value_twice_marks_once() {
        let (engine, changes) = engine();
        engine.set("Age", 30).unwrap();
        engine.invoke(RESET_HAS_CHANGES, vec![]).unwrap();

        engine.set("Age", 31).unwrap();
        engine.set("Age", 31).unwrap();
        assert_eq!(changes.changes(), vec!["Age".to_string()]);
        assert!(flag(&engine, HAS_CHANGES));

        engine.invoke(RESET_HAS_CHANGES, vec![]).unwrap();
        engine.set("Age", 31).unwrap();
        assert!(!flag(&engine, HAS_CHANGES));
    }

    #[test]
    fn test_changes_in_first_change_order() {
        let (engine, _) = engine();
        engine.set("Name", "a").unwrap();
        engine.set("Age", 1).unwrap();
        engine.set("Name", "b").unwrap();
        assert_eq!(
            engine.invoke(CHANGES, vec![]).unwrap(),
            Value::List(vec![Value::from("Name"), Value::from("Age")])
        );
        assert_eq!(
            engine.invoke(IS_CHANGED, vec![Value::from("age")]).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_tracking_toggle() {
        let (engine, changes) = engine();
        engine.invoke(DO_NOT_TRACK_CHANGES, vec![]).unwrap();
        engine.set("Age", 1).unwrap();
        assert!(!flag(&engine, HAS_CHANGES));

        engine.invoke(TRACK_CHANGES, vec![]).unwrap();
        engine.set("Age", 2).unwrap();
        assert!(changes.is_changed("Age"));
    }

    #[test]
    fn test_buffered_writes_count_on_commit() {
        let (engine, changes) = engine();
        engine.attach(Arc::new(Transaction::new())).unwrap();

        engine.invoke(START_TRANSACTION, vec![]).unwrap();
        engine.set("Age", 7).unwrap();
        assert!(changes.changes().is_empty());

        engine.invoke(COMMIT_TRANSACTION, vec![]).unwrap();
        assert!(changes.is_changed("Age"));
    }
}
