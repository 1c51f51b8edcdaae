//! Built-in extensions for the AspectConf engine
//!
//! Each extension contributes one behavior to a configuration object:
//! default values, descriptions and tags, write protection, transactions,
//! change tracking and change notification. An extension is selected by the
//! capability marker a contract declares; the infrastructure contracts in
//! [`contracts`] carry those markers together with the methods they expose.
//!
//! Every extension also ships an extension trait (e.g. [`TransactionExt`])
//! implemented for any [`ConfigObject`], so typed and dynamic proxies can call
//! the extension's methods directly.

#![warn(missing_docs)]

pub mod contracts;
pub mod default_value;
pub mod description;
pub mod has_changes;
pub mod notify;
pub mod transaction;
pub mod write_protect;

pub use contracts::*;
pub use default_value::{DefaultValue, DefaultValueExt};
pub use description::{Description, DescriptionExt};
pub use has_changes::{HasChanges, HasChangesExt};
pub use notify::{
    NotifyChanged, NotifyChanging, NotifyExt, PropertyChangeEvent, SubscriptionId,
};
pub use transaction::{Transaction, TransactionExt};
pub use write_protect::{WriteProtect, WriteProtectExt};

use aspectconf_core::{ConfigObject, ConfigValue, Error, Result, Value};

/// Capability markers of the built-in extensions
pub mod capability {
    /// [`DefaultValue`](crate::DefaultValue)
    pub const DEFAULT_VALUE: &str = "DefaultValue";
    /// [`Description`](crate::Description)
    pub const DESCRIPTION: &str = "Description";
    /// [`WriteProtect`](crate::WriteProtect)
    pub const WRITE_PROTECT: &str = "WriteProtect";
    /// [`Transaction`](crate::Transaction)
    pub const TRANSACTION: &str = "Transaction";
    /// [`HasChanges`](crate::HasChanges)
    pub const HAS_CHANGES: &str = "HasChanges";
    /// [`NotifyChanging`](crate::NotifyChanging)
    pub const NOTIFY_CHANGING: &str = "NotifyChanging";
    /// [`NotifyChanged`](crate::NotifyChanged)
    pub const NOTIFY_CHANGED: &str = "NotifyChanged";
}

/// Invoke `method` on `target` and read the result as a boolean
pub(crate) fn call_flag<T: ConfigObject + ?Sized>(
    target: &T,
    method: &str,
    args: Vec<Value>,
) -> Result<bool> {
    let value = target.call(method, args)?;
    bool::from_value(value).map_err(|e| Error::conversion(method, e))
}

/// Invoke `method` on `target`, discarding the result
pub(crate) fn call_unit<T: ConfigObject + ?Sized>(
    target: &T,
    method: &str,
    args: Vec<Value>,
) -> Result<()> {
    target.call(method, args).map(|_| ())
}
