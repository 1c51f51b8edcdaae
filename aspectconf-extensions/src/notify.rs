//! Change notification
//!
//! [`NotifyChanging`] fires right before the terminal store write and
//! [`NotifyChanged`] right after it. Both fire only when the write changes the
//! stored value. Subscribers run synchronously on the writing thread, outside
//! the subscriber lock, so a subscriber may read or write the configuration.

use crate::capability;
use aspectconf_core::{order, ConfigObject, Engine, Error, Extension, Result, SetContext, Value};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Payload delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChangeEvent {
    /// Declared property name
    pub name: String,
    /// Stored value before the write, if any
    pub old_value: Option<Value>,
    /// Value being written, converted to the property's type
    pub new_value: Value,
}

/// Handle returned by `subscribe`, unique across notifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&PropertyChangeEvent) + Send + Sync>;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(0);

#[derive(Default)]
struct Subscribers {
    entries: Mutex<Vec<(SubscriptionId, Subscriber)>>,
}

impl Subscribers {
    fn subscribe(&self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push((id, subscriber));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn publish(&self, event: &PropertyChangeEvent) {
        let subscribers: Vec<Subscriber> = self
            .entries
            .lock()
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();
        for subscriber in subscribers {
            subscriber(event);
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}

macro_rules! notifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name {
            subscribers: Subscribers,
        }

        impl $name {
            /// Create the extension with no subscribers
            pub fn new() -> Self {
                Self::default()
            }

            /// Register a subscriber
            pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
            where
                F: Fn(&PropertyChangeEvent) + Send + Sync + 'static,
            {
                self.subscribers.subscribe(Arc::new(subscriber))
            }

            /// Remove a subscriber; false if it was not registered
            pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
                self.subscribers.unsubscribe(id)
            }

            /// Number of registered subscribers
            pub fn subscriber_count(&self) -> usize {
                self.subscribers.len()
            }
        }
    };
}

notifier!(
    /// Publishes an event before a changing write is stored
    NotifyChanging
);

notifier!(
    /// Publishes an event after a changing write is stored
    NotifyChanged
);

impl NotifyChanging {
    fn on_set(&self, ctx: &mut SetContext) -> Result<()> {
        // Unconvertible values are left for the terminal setter to reject
        let Ok(new_value) = ctx.descriptor().coerce(&ctx.new_value) else {
            return Ok(());
        };
        if ctx.old_value.as_ref() == Some(&new_value) {
            return Ok(());
        }
        trace!("{} changing", ctx.name());
        self.subscribers.publish(&PropertyChangeEvent {
            name: ctx.name().to_string(),
            old_value: ctx.old_value.clone(),
            new_value,
        });
        Ok(())
    }
}

impl NotifyChanged {
    fn on_set(&self, ctx: &mut SetContext) -> Result<()> {
        if !ctx.is_stored() || !ctx.is_change() {
            return Ok(());
        }
        trace!("{} changed", ctx.name());
        self.subscribers.publish(&PropertyChangeEvent {
            name: ctx.name().to_string(),
            old_value: ctx.old_value.clone(),
            new_value: ctx.new_value.clone(),
        });
        Ok(())
    }
}

impl Extension for NotifyChanging {
    fn name(&self) -> &str {
        capability::NOTIFY_CHANGING
    }

    fn attach(self: Arc<Self>, engine: &Engine) -> Result<()> {
        engine.register_set_interceptor(order::BEFORE_STORE, move |_, ctx| self.on_set(ctx));
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Extension for NotifyChanged {
    fn name(&self) -> &str {
        capability::NOTIFY_CHANGED
    }

    fn attach(self: Arc<Self>, engine: &Engine) -> Result<()> {
        engine.register_set_interceptor(order::NOTIFY, move |_, ctx| self.on_set(ctx));
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn attached<T: Extension>(engine: &Engine, capability: &str) -> Result<Arc<T>> {
    engine
        .extension::<T>()
        .ok_or_else(|| Error::NotSupported(format!("{} is not attached", capability)))
}

/// Subscription methods on any configuration object
pub trait NotifyExt: ConfigObject {
    /// Subscribe to writes about to change a value
    fn on_property_changing<F>(&self, subscriber: F) -> Result<SubscriptionId>
    where
        F: Fn(&PropertyChangeEvent) + Send + Sync + 'static,
    {
        let notifier = attached::<NotifyChanging>(self.engine(), capability::NOTIFY_CHANGING)?;
        Ok(notifier.subscribe(subscriber))
    }

    /// Subscribe to writes that changed a value
    fn on_property_changed<F>(&self, subscriber: F) -> Result<SubscriptionId>
    where
        F: Fn(&PropertyChangeEvent) + Send + Sync + 'static,
    {
        let notifier = attached::<NotifyChanged>(self.engine(), capability::NOTIFY_CHANGED)?;
        Ok(notifier.subscribe(subscriber))
    }

    /// Remove a subscription from whichever notifier issued it
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let engine = self.engine();
        let changing = engine
            .extension::<NotifyChanging>()
            .is_some_and(|n| n.unsubscribe(id));
        let changed = engine
            .extension::<NotifyChanged>()
            .is_some_and(|n| n.unsubscribe(id));
        changing || changed
    }
}

impl<T: ConfigObject + ?Sized> NotifyExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use aspectconf_core::metadata::{resolve, skip_infrastructure};
    use aspectconf_core::{ContractDefinition, ContractProxy, PropertySpec, ValueType};

    fn proxy() -> ContractProxy {
        let contract = ContractDefinition::builder("IPerson")
            .property(PropertySpec::new("Age", ValueType::Integer))
            .property(PropertySpec::new("Name", ValueType::String))
            .build()
            .unwrap();
        let engine = Arc::new(Engine::new(Arc::new(resolve(
            &contract,
            &skip_infrastructure,
        ))));
        engine.attach(Arc::new(NotifyChanging::new())).unwrap();
        engine.attach(Arc::new(NotifyChanged::new())).unwrap();
        ContractProxy::new(engine, contract)
    }

    type Listener = Box<dyn Fn(&PropertyChangeEvent) + Send + Sync>;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Listener) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&log);
        let make = move |tag: &str| -> Listener {
            let log = Arc::clone(&shared);
            let tag = tag.to_string();
            Box::new(move |event: &PropertyChangeEvent| {
                log.lock().push(format!(
                    "{}:{}:{:?}->{}",
                    tag, event.name, event.old_value, event.new_value
                ));
            })
        };
        (log, make)
    }

    #[test]
    fn test_changing_then_changed() {
        let proxy = proxy();
        let (log, make) = recorder();
        proxy.on_property_changing(make("changing")).unwrap();
        proxy.on_property_changed(make("changed")).unwrap();

        proxy.set("Age", "30".to_string()).unwrap();
        assert_eq!(
            *log.lock(),
            vec![
                "changing:Age:None->30".to_string(),
                "changed:Age:None->30".to_string()
            ]
        );
    }

    #[test]
    fn test_same_value_fires_nothing() {
        let proxy = proxy();
        proxy.set("Age", 30).unwrap();

        let (log, make) = recorder();
        proxy.on_property_changing(make("changing")).unwrap();
        proxy.on_property_changed(make("changed")).unwrap();
        proxy.set("Age", 30).unwrap();
        assert!(log.lock().is_empty());

        proxy.set("Age", 31).unwrap();
        assert_eq!(log.lock().len(), 2);
        assert_eq!(log.lock()[1], "changed:Age:Some(Integer(30))->31");
    }

    #[test]
    fn test_rejected_write_fires_nothing() {
        let proxy = proxy();
        proxy.engine().register_set_interceptor(order::VETO, |_, ctx| {
            ctx.fail(Error::WriteProtected(ctx.name().to_string()));
            Ok(())
        });

        let (log, make) = recorder();
        proxy.on_property_changing(make("changing")).unwrap();
        proxy.on_property_changed(make("changed")).unwrap();
        assert!(proxy.set("Age", 5).is_err());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let proxy = proxy();
        let (log, make) = recorder();
        let id = proxy.on_property_changed(make("changed")).unwrap();
        assert!(proxy.unsubscribe(id));
        assert!(!proxy.unsubscribe(id));

        proxy.set("Name", "Robin".to_string()).unwrap();
        assert!(log.lock().is_empty());
        let changed = proxy.engine().extension::<NotifyChanged>().unwrap();
        assert_eq!(changed.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_may_write_back() {
        let proxy = proxy();
        let engine = Arc::clone(proxy.engine());
        proxy
            .on_property_changed(move |event| {
                if event.name == "Age" {
                    engine.set("Name", format!("age {}", event.new_value)).unwrap();
                }
            })
            .unwrap();

        proxy.set("Age", 3).unwrap();
        assert_eq!(proxy.get::<String>("Name").unwrap(), "age 3");
    }

    #[test]
    fn test_missing_notifier_is_not_supported() {
        let contract = ContractDefinition::builder("IBare").build().unwrap();
        let engine = Arc::new(Engine::new(Arc::new(resolve(
            &contract,
            &skip_infrastructure,
        ))));
        let proxy = ContractProxy::new(engine, contract);
        assert!(matches!(
            proxy.on_property_changed(|_| {}),
            Err(Error::NotSupported(_))
        ));
    }
}
