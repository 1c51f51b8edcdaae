//! Write protection

use crate::{call_flag, call_unit, capability};
use aspectconf_core::{
    order, ConfigObject, Engine, Error, Extension, Result, SetContext, Value,
};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Method opening a protection window
pub const START_WRITE_PROTECTING: &str = "StartWriteProtecting";
/// Method closing the protection window
pub const STOP_WRITE_PROTECTING: &str = "StopWriteProtecting";
/// Method protecting one property
pub const WRITE_PROTECT: &str = "WriteProtect";
/// Method removing protection from one property
pub const DISABLE_WRITE_PROTECT: &str = "DisableWriteProtect";
/// Method removing protection from every property
pub const REMOVE_WRITE_PROTECTION: &str = "RemoveWriteProtection";
/// Method reporting whether a property is protected
pub const IS_WRITE_PROTECTED: &str = "IsWriteProtected";

#[derive(Debug, Default)]
struct ProtectState {
    protecting: bool,
    protected: FxHashSet<String>,
}

/// Rejects writes to protected properties.
///
/// While a protection window is open, every property written becomes protected
/// once that write completes; the write itself goes through.
#[derive(Debug, Default)]
pub struct WriteProtect {
    state: Mutex<ProtectState>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl WriteProtect {
    /// Create the extension with nothing protected
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is protected
    pub fn is_protected(&self, name: &str) -> bool {
        self.state.lock().protected.contains(&key(name))
    }

    fn on_set(&self, ctx: &mut SetContext) -> Result<()> {
        let mut state = self.state.lock();
        let name = key(ctx.name());
        if state.protected.contains(&name) {
            drop(state);
            debug!("Rejected write to protected property {}", ctx.name());
            ctx.fail(Error::WriteProtected(ctx.name().to_string()));
        } else if state.protecting {
            state.protected.insert(name);
        }
        Ok(())
    }

    fn protect(&self, engine: &Engine, name: &str) -> Result<()> {
        let descriptor = engine
            .property_table()
            .get(name)
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))?;
        self.state.lock().protected.insert(key(descriptor.name()));
        Ok(())
    }
}

impl Extension for WriteProtect {
    fn name(&self) -> &str {
        capability::WRITE_PROTECT
    }

    fn attach(self: Arc<Self>, engine: &Engine) -> Result<()> {
        let this = Arc::clone(&self);
        engine.register_set_interceptor(order::VETO, move |_, ctx| this.on_set(ctx));

        let this = Arc::clone(&self);
        engine.register_method(START_WRITE_PROTECTING, move |_, _| {
            this.state.lock().protecting = true;
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(STOP_WRITE_PROTECTING, move |_, _| {
            this.state.lock().protecting = false;
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(WRITE_PROTECT, move |engine, ctx| {
            this.protect(engine, ctx.str_arg(0)?)
        });
        let this = Arc::clone(&self);
        engine.register_method(DISABLE_WRITE_PROTECT, move |_, ctx| {
            let name = key(ctx.str_arg(0)?);
            this.state.lock().protected.remove(&name);
            Ok(())
        });
        let this = Arc::clone(&self);
        engine.register_method(REMOVE_WRITE_PROTECTION, move |_, _| {
            this.state.lock().protected.clear();
            Ok(())
        });
        engine.register_method(IS_WRITE_PROTECTED, move |_, ctx| {
            let protected = self.is_protected(ctx.str_arg(0)?);
            ctx.result = Value::Boolean(protected);
            Ok(())
        });
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Write-protection methods on any configuration object
pub trait WriteProtectExt: ConfigObject {
    /// Protect every property written from now until [`stop_write_protecting`](Self::stop_write_protecting)
    fn start_write_protecting(&self) -> Result<()> {
        call_unit(self, START_WRITE_PROTECTING, vec![])
    }

    /// Close the protection window; already protected properties stay protected
    fn stop_write_protecting(&self) -> Result<()> {
        call_unit(self, STOP_WRITE_PROTECTING, vec![])
    }

    /// Protect `name` immediately
    fn write_protect(&self, name: &str) -> Result<()> {
        call_unit(self, WRITE_PROTECT, vec![Value::from(name)])
    }

    /// Remove protection from `name`
    fn disable_write_protect(&self, name: &str) -> Result<()> {
        call_unit(self, DISABLE_WRITE_PROTECT, vec![Value::from(name)])
    }

    /// Remove protection from every property
    fn remove_write_protection(&self) -> Result<()> {
        call_unit(self, REMOVE_WRITE_PROTECTION, vec![])
    }

    /// Whether `name` is protected
    fn is_write_protected(&self, name: &str) -> Result<bool> {
        call_flag(self, IS_WRITE_PROTECTED, vec![Value::from(name)])
    }
}

impl<T: ConfigObject + ?Sized> WriteProtectExt for T {}
