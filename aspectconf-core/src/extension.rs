//! The extension contract
//!
//! An extension contributes one cross-cutting behavior to an [`Engine`]. It is
//! attached once, before the configuration object is handed out, and keeps its
//! own state for as long as the engine lives.

use crate::engine::Engine;
use crate::error::Result;
use crate::metadata::PropertyDescriptor;
use std::any::Any;
use std::sync::Arc;

pub trait Extension: Send + Sync + 'static {
    /// Capability marker this extension implements
    fn name(&self) -> &str;

    /// Extensions are initialized in ascending order; ties keep attach order
    fn init_order(&self) -> i32 {
        0
    }

    /// Register interceptors and methods on `engine`
    fn attach(self: Arc<Self>, engine: &Engine) -> Result<()>;

    /// Called once per property after every extension is attached
    fn initialize_property(&self, _engine: &Engine, _descriptor: &PropertyDescriptor) -> Result<()> {
        Ok(())
    }

    /// Called once after every property has been initialized
    fn properties_initialized(&self, _engine: &Engine) -> Result<()> {
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}
