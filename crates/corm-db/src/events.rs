//! Lifecycle Dispatcher.
//!
//! Callbacks are registered per model type and event name. When an event fires
//! on an instance, callbacks of every type in the instance's lineage run, root
//! ancestor first, each group in registration order.
//!
//! | Timing | Callback returns `Err` |
//! |--------|------------------------|
//! | before (`creating`, `updating`, ...) | operation aborted with `OperationVetoed` |
//! | after (`created`, `updated`, ...) | logged with `tracing::warn!`, operation stands |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use corm_core::enums::LifecycleEvent;

use crate::error::ModelError;
use crate::model::Model;

/// A callback's refusal to let an operation proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    reason: String,
}

impl Rejection {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl From<&str> for Rejection {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}

impl From<String> for Rejection {
    fn from(reason: String) -> Self {
        Self::new(reason)
    }
}

impl From<ModelError> for Rejection {
    fn from(err: ModelError) -> Self {
        Self::new(err.to_string())
    }
}

pub type HookResult = Result<(), Rejection>;

/// A lifecycle callback. Receives the instance the event fired on.
pub type Hook = Arc<dyn Fn(&mut Model) -> HookResult + Send + Sync>;

/// Callbacks keyed by (model type, event).
#[derive(Default, Clone)]
pub struct Dispatcher {
    hooks: HashMap<(&'static str, LifecycleEvent), Vec<Hook>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `hook` to the callbacks of `event` on `model`.
    pub fn register(&mut self, model: &'static str, event: LifecycleEvent, hook: Hook) {
        self.hooks.entry((model, event)).or_default().push(hook);
    }

    /// Number of callbacks registered directly on `model` for `event`.
    #[must_use]
    pub fn count(&self, model: &str, event: LifecycleEvent) -> usize {
        self.hooks
            .iter()
            .filter(|((m, e), _)| *m == model && *e == event)
            .map(|(_, hooks)| hooks.len())
            .sum()
    }

    /// Run the callbacks of `event` for every type in `lineage` (root first).
    ///
    /// # Errors
    ///
    /// Returns `ModelError::OperationVetoed` when a before-event callback
    /// rejects. Later callbacks do not run. After-event rejections are logged
    /// and never returned.
    pub fn fire(
        &self,
        lineage: &[&'static str],
        event: LifecycleEvent,
        model: &mut Model,
    ) -> Result<(), ModelError> {
        for ty in lineage {
            let Some(hooks) = self.hooks.get(&(*ty, event)) else {
                continue;
            };
            for hook in hooks {
                let Err(rejection) = hook(model) else {
                    continue;
                };
                if event.is_before() {
                    tracing::debug!(
                        model = model.type_name(),
                        event = event.as_str(),
                        reason = rejection.reason(),
                        "operation vetoed"
                    );
                    return Err(ModelError::OperationVetoed {
                        model: model.type_name().to_string(),
                        event,
                        reason: rejection.reason,
                    });
                }
                tracing::warn!(
                    model = model.type_name(),
                    event = event.as_str(),
                    reason = rejection.reason(),
                    "after-event callback failed"
                );
            }
        }
        Ok(())
    }
}

/// Boot-time handle for registering one type's lifecycle callbacks.
pub struct Hooks<'a> {
    dispatcher: &'a mut Dispatcher,
    model: &'static str,
}

macro_rules! event_registrars {
    ($($name:ident => $event:ident),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($name), "` callback.")]
            pub fn $name<F>(&mut self, hook: F) -> &mut Self
            where
                F: Fn(&mut Model) -> HookResult + Send + Sync + 'static,
            {
                self.on(LifecycleEvent::$event, hook)
            }
        )*
    };
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(dispatcher: &'a mut Dispatcher, model: &'static str) -> Self {
        Self { dispatcher, model }
    }

    #[must_use]
    pub const fn model(&self) -> &'static str {
        self.model
    }

    pub fn on<F>(&mut self, event: LifecycleEvent, hook: F) -> &mut Self
    where
        F: Fn(&mut Model) -> HookResult + Send + Sync + 'static,
    {
        self.dispatcher.register(self.model, event, Arc::new(hook));
        self
    }

    event_registrars! {
        creating => Creating,
        created => Created,
        updating => Updating,
        updated => Updated,
        deleting => Deleting,
        deleted => Deleted,
        trashing => Trashing,
        trashed => Trashed,
        restoring => Restoring,
        restored => Restored,
    }
}
