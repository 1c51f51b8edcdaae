//! Infrastructure contracts
//!
//! An application contract opts into an extension by extending one of these.
//! They carry the capability marker and the method names of their extension
//! and declare no properties; the resolver skips them when building the
//! property table.

use crate::{
    capability, default_value, description, has_changes, transaction, write_protect,
};
use aspectconf_core::engine::RESTORE_TO_DEFAULT;
use aspectconf_core::ContractDefinition;
use std::sync::{Arc, OnceLock};

macro_rules! infrastructure_contract {
    ($(#[$meta:meta])* $fn_name:ident, $name:literal, $capability:expr, [$($method:expr),* $(,)?]) => {
        $(#[$meta])*
        pub fn $fn_name() -> Arc<ContractDefinition> {
            static CONTRACT: OnceLock<Arc<ContractDefinition>> = OnceLock::new();
            Arc::clone(CONTRACT.get_or_init(|| {
                ContractDefinition::builder($name)
                    .infrastructure()
                    .capability($capability)
                    $(.method($method))*
                    .finish()
            }))
        }
    };
}

infrastructure_contract!(
    /// Opts into [`DefaultValue`](crate::DefaultValue)
    default_value_contract,
    "IDefaultValue",
    capability::DEFAULT_VALUE,
    [
        default_value::DEFAULT_VALUE_FOR,
        RESTORE_TO_DEFAULT,
        default_value::RESTORE_ALL_TO_DEFAULTS,
    ]
);

infrastructure_contract!(
    /// Opts into [`Description`](crate::Description)
    description_contract,
    "IDescription",
    capability::DESCRIPTION,
    [
        description::DESCRIPTION_FOR,
        description::IS_TAGGED_WITH,
        description::GET_TAG_VALUE,
        description::PROPERTIES_TAGGED_WITH,
    ]
);

infrastructure_contract!(
    /// Opts into [`WriteProtect`](crate::WriteProtect)
    write_protect_contract,
    "IWriteProtect",
    capability::WRITE_PROTECT,
    [
        write_protect::START_WRITE_PROTECTING,
        write_protect::STOP_WRITE_PROTECTING,
        write_protect::WRITE_PROTECT,
        write_protect::DISABLE_WRITE_PROTECT,
        write_protect::REMOVE_WRITE_PROTECTION,
        write_protect::IS_WRITE_PROTECTED,
    ]
);

infrastructure_contract!(
    /// Opts into [`Transaction`](crate::Transaction)
    transaction_contract,
    "ITransaction",
    capability::TRANSACTION,
    [
        transaction::START_TRANSACTION,
        transaction::COMMIT_TRANSACTION,
        transaction::ROLLBACK_TRANSACTION,
        transaction::IS_TRANSACTION_DIRTY,
        transaction::IS_IN_TRANSACTION,
    ]
);

infrastructure_contract!(
    /// Opts into [`HasChanges`](crate::HasChanges)
    has_changes_contract,
    "IHasChanges",
    capability::HAS_CHANGES,
    [
        has_changes::TRACK_CHANGES,
        has_changes::DO_NOT_TRACK_CHANGES,
        has_changes::HAS_CHANGES,
        has_changes::RESET_HAS_CHANGES,
        has_changes::CHANGES,
        has_changes::IS_CHANGED,
    ]
);

infrastructure_contract!(
    /// Opts into [`NotifyChanging`](crate::NotifyChanging)
    notify_changing_contract,
    "INotifyPropertyChanging",
    capability::NOTIFY_CHANGING,
    []
);

infrastructure_contract!(
    /// Opts into [`NotifyChanged`](crate::NotifyChanged)
    notify_changed_contract,
    "INotifyPropertyChanged",
    capability::NOTIFY_CHANGED,
    []
);

/// Infrastructure contract carrying `capability`, looked up case-insensitively
pub fn infrastructure_contract(capability: &str) -> Option<Arc<ContractDefinition>> {
    let all: [fn() -> Arc<ContractDefinition>; 7] = [
        default_value_contract,
        description_contract,
        write_protect_contract,
        transaction_contract,
        has_changes_contract,
        notify_changing_contract,
        notify_changed_contract,
    ];
    all.into_iter()
        .map(|contract| contract())
        .find(|contract| {
            contract
                .capabilities()
                .iter()
                .any(|c| c.eq_ignore_ascii_case(capability))
        })
}
