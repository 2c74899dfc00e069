//! Value providers attached to listeners.
//!
//! A [`Provider`] writes a value into the listener's [`DispatchContext`]
//! after the matchers succeeded and before extraction. Listeners read
//! provided values through [`Provided<T>`](crate::extractor::Provided) or by
//! name through [`DispatchContext::get_named`].

use std::fmt;
use std::sync::Arc;

use crate::context::{DispatchContext, short_type_name};

type ProvideFn = Arc<dyn Fn(&DispatchContext) + Send + Sync>;

/// A value factory run once per dispatch.
#[derive(Clone)]
pub struct Provider {
    label: String,
    provide: ProvideFn,
}

impl Provider {
    /// Provides the value computed by `f`, keyed by its type.
    ///
    /// When `f` returns `None` nothing is inserted and extractors asking for
    /// `T` fail, skipping the listener.
    pub fn by_type<T, F>(f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&DispatchContext) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            label: short_type_name::<T>().to_string(),
            provide: Arc::new(move |ctx| {
                if let Some(value) = f(ctx) {
                    ctx.insert(value);
                }
            }),
        }
    }

    /// Provides the value computed by `f` under `name`.
    pub fn named<T, F>(name: impl Into<String>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&DispatchContext) -> Option<T> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            label: name.clone(),
            provide: Arc::new(move |ctx| {
                if let Some(value) = f(ctx) {
                    ctx.insert_named(name.clone(), value);
                }
            }),
        }
    }

    /// Provides a clone of a fixed value, keyed by its type.
    pub fn value<T>(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::by_type(move |_| Some(value.clone()))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn provide(&self, ctx: &DispatchContext) {
        (self.provide)(ctx);
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Provider").field(&self.label).finish()
    }
}
