//! Per-call contexts passed through the get/set/invoke pipelines

use crate::error::Error;
use crate::metadata::PropertyDescriptor;
use crate::value::Value;
use std::sync::Arc;

/// State of one `get` call
#[derive(Debug)]
pub struct GetContext {
    descriptor: Arc<PropertyDescriptor>,
    /// Value handed back to the caller
    pub value: Value,
    /// Whether `value` came from a store rather than the type's empty value
    pub has_value: bool,
    proceed: bool,
    error: Option<Error>,
}

impl GetContext {
    pub(crate) fn new(descriptor: Arc<PropertyDescriptor>, stored: Option<Value>) -> Self {
        let has_value = stored.is_some();
        let value = stored.unwrap_or_else(|| descriptor.value_type().empty());
        Self {
            descriptor,
            value,
            has_value,
            proceed: true,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &Arc<PropertyDescriptor> {
        &self.descriptor
    }

    /// Stop the pipeline after the current interceptor
    pub fn halt(&mut self) {
        self.proceed = false;
    }

    /// Record an expected failure; the pipeline stops and the error reaches the caller
    pub fn fail(&mut self, error: Error) {
        self.error = Some(error);
        self.proceed = false;
    }

    pub fn is_halted(&self) -> bool {
        !self.proceed
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub(crate) fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

/// State of one `set` call
#[derive(Debug)]
pub struct SetContext {
    descriptor: Arc<PropertyDescriptor>,
    /// Value currently in the store, if any
    pub old_value: Option<Value>,
    /// Value being written; replaced by its coerced form once stored
    pub new_value: Value,
    proceed: bool,
    stored: bool,
    error: Option<Error>,
}

impl SetContext {
    pub(crate) fn new(
        descriptor: Arc<PropertyDescriptor>,
        old_value: Option<Value>,
        new_value: Value,
    ) -> Self {
        Self {
            descriptor,
            old_value,
            new_value,
            proceed: true,
            stored: false,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &Arc<PropertyDescriptor> {
        &self.descriptor
    }

    pub fn has_old_value(&self) -> bool {
        self.old_value.is_some()
    }

    /// True when there was no previous value or it differs from the new one
    pub fn is_change(&self) -> bool {
        match &self.old_value {
            Some(old) => *old != self.new_value,
            None => true,
        }
    }

    /// Whether the terminal setter wrote the value store during this call
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    pub(crate) fn mark_stored(&mut self) {
        self.stored = true;
    }

    pub fn halt(&mut self) {
        self.proceed = false;
    }

    pub fn fail(&mut self, error: Error) {
        self.error = Some(error);
        self.proceed = false;
    }

    pub fn is_halted(&self) -> bool {
        !self.proceed
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub(crate) fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

/// State of one `invoke` call
#[derive(Debug)]
pub struct InvokeContext {
    name: String,
    args: Vec<Value>,
    /// Return value; the last handler to run decides it
    pub result: Value,
    error: Option<Error>,
}

impl InvokeContext {
    pub(crate) fn new(name: &str, args: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            args,
            result: Value::Nil,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Argument `index` as a string, failing the call with `NotSupported` otherwise
    pub fn str_arg(&self, index: usize) -> Result<&str, Error> {
        match self.args.get(index) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(Error::NotSupported(format!(
                "{}: argument {} must be a string, got {}",
                self.name,
                index,
                other.type_name()
            ))),
            None => Err(Error::NotSupported(format!(
                "{}: missing argument {}",
                self.name, index
            ))),
        }
    }

    pub fn fail(&mut self, error: Error) {
        self.error = Some(error);
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub(crate) fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}
