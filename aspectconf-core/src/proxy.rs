//! Contract proxies: dispatching façades over an engine
//!
//! A proxy holds no configuration state of its own. Property reads become
//! `engine.get`, writes become `engine.set`, and declared methods become
//! `engine.invoke`. Typed proxies are generated with [`config_contract!`].

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::metadata::{ContractDefinition, ContractKey};
use crate::value::{ConfigValue, Value};
use std::fmt;
use std::sync::Arc;

/// Anything backed by an engine
pub trait ConfigObject {
    fn engine(&self) -> &Arc<Engine>;

    /// Invoke an engine method by name
    fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.engine().invoke(method, args)
    }
}

/// A contract implemented by a Rust type
pub trait ConfigContract: ConfigObject + Sized {
    /// The contract's definition, built once per type
    fn definition() -> Arc<ContractDefinition>;

    /// Key under which the resolved property table is cached
    fn contract_key() -> ContractKey;

    /// Wrap a proxy bound to a freshly built engine
    fn from_proxy(proxy: ContractProxy) -> Self;

    fn proxy(&self) -> &ContractProxy;
}

/// Dynamic dispatch façade bound to exactly one engine
#[derive(Clone)]
pub struct ContractProxy {
    engine: Arc<Engine>,
    contract: Arc<ContractDefinition>,
}

impl ContractProxy {
    pub fn new(engine: Arc<Engine>, contract: Arc<ContractDefinition>) -> Self {
        Self { engine, contract }
    }

    pub fn contract(&self) -> &Arc<ContractDefinition> {
        &self.contract
    }

    /// Read a property and convert it to `T`
    pub fn get<T: ConfigValue>(&self, name: &str) -> Result<T> {
        let value = self.engine.get(name)?.value;
        T::from_value(value).map_err(|e| Error::conversion(name, e))
    }

    /// Write a property
    pub fn set<T: ConfigValue>(&self, name: &str, value: T) -> Result<()> {
        self.engine.set(name, value.into_value()).map(|_| ())
    }

    /// Indexer read by string key
    pub fn get_item(&self, key: &str) -> Result<Value> {
        self.engine.get_value(key)
    }

    /// Indexer write by string key
    pub fn set_item(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.engine.set(key, value).map(|_| ())
    }

    /// Invoke a method declared by the contract or one of its ancestors
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        if !self.contract.declares_method(method) {
            return Err(Error::NotSupported(format!(
                "{} does not declare method '{}'",
                self.contract.name(),
                method
            )));
        }
        self.engine.invoke(method, args)
    }
}

impl ConfigObject for ContractProxy {
    fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}

impl fmt::Debug for ContractProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractProxy")
            .field("contract", &self.contract.name())
            .field("engine", &self.engine)
            .finish()
    }
}

/// Declare a typed configuration contract.
///
/// ```ignore
/// config_contract! {
///     /// Settings for a person
///     pub struct PersonSettings: "IPerson" {
///         extends: [transaction_contract()],
///         capabilities: ["DefaultValue"],
///         properties: {
///             age / set_age: i64 => "Age" { default("21"), tag("Expert") },
///             first_name / set_first_name: String => "FirstName",
///         },
///         methods: {
///             reload => "Reload",
///         },
///     }
/// }
/// ```
///
/// Each property entry becomes a getter and a setter; each `{ ... }` item is a
/// call on [`PropertySpec`](crate::metadata::PropertySpec). Each method becomes
/// a forwarding call to `engine.invoke`.
#[macro_export]
macro_rules! config_contract {
    (
        $(#[$meta:meta])*
        $vis:vis struct $ty:ident : $contract:literal {
            $(extends: [$($parent:expr),* $(,)?],)?
            $(capabilities: [$($cap:expr),* $(,)?],)?
            properties: {
                $(
                    $(#[$pmeta:meta])*
                    $getter:ident / $setter:ident : $pty:ty => $pname:literal
                    $({ $($attr:ident ( $($arg:expr),* $(,)? )),* $(,)? })?
                ),* $(,)?
            }
            $(, methods: {
                $(
                    $(#[$mmeta:meta])*
                    $method:ident => $mname:literal
                ),* $(,)?
            })?
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $ty {
            proxy: $crate::proxy::ContractProxy,
        }

        impl $ty {
            /// Contract definition shared by every instance
            pub fn definition() -> ::std::sync::Arc<$crate::metadata::ContractDefinition> {
                static DEFINITION: ::std::sync::OnceLock<
                    ::std::sync::Arc<$crate::metadata::ContractDefinition>,
                > = ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(DEFINITION.get_or_init(|| {
                    let builder = $crate::metadata::ContractDefinition::builder($contract);
                    $($(let builder = builder.extends($parent);)*)?
                    $($(let builder = builder.capability($cap);)*)?
                    $(
                        let builder = builder.property(
                            $crate::metadata::PropertySpec::typed::<$pty>($pname)
                            $($(.$attr($($arg),*))*)?
                        );
                    )*
                    $($(let builder = builder.method($mname);)*)?
                    builder.finish()
                }))
            }

            $(
                $(#[$pmeta])*
                pub fn $getter(&self) -> $crate::Result<$pty> {
                    self.proxy.get::<$pty>($pname)
                }

                pub fn $setter(&self, value: $pty) -> $crate::Result<()> {
                    self.proxy.set::<$pty>($pname, value)
                }
            )*

            $($(
                $(#[$mmeta])*
                pub fn $method(
                    &self,
                    args: ::std::vec::Vec<$crate::value::Value>,
                ) -> $crate::Result<$crate::value::Value> {
                    self.proxy.invoke($mname, args)
                }
            )*)?
        }

        impl $crate::proxy::ConfigObject for $ty {
            fn engine(&self) -> &::std::sync::Arc<$crate::engine::Engine> {
                $crate::proxy::ConfigObject::engine(&self.proxy)
            }
        }

        impl $crate::proxy::ConfigContract for $ty {
            fn definition() -> ::std::sync::Arc<$crate::metadata::ContractDefinition> {
                <$ty>::definition()
            }

            fn contract_key() -> $crate::metadata::ContractKey {
                $crate::metadata::ContractKey::Type(::std::any::TypeId::of::<$ty>())
            }

            fn from_proxy(proxy: $crate::proxy::ContractProxy) -> Self {
                Self { proxy }
            }

            fn proxy(&self) -> &$crate::proxy::ContractProxy {
                &self.proxy
            }
        }

        impl ::std::ops::Deref for $ty {
            type Target = $crate::proxy::ContractProxy;

            fn deref(&self) -> &Self::Target {
                &self.proxy
            }
        }
    };
}
