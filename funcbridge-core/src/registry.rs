//! Registry of invocable functions.
//!
//! Hosts address functions by metadata name in load requests and by the
//! assigned function id afterwards. The registry only covers the first
//! half: name to handler. Id assignment happens at load time and lives
//! with the channel.
use crate::BoxError;
use crate::context::{BindingSlot, Context};
use crate::value::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// How a handler future finished.
#[derive(Debug, PartialEq)]
pub enum HandlerOutcome {
    /// Normal return; the invocation completes with this value unless
    /// the handler already completed it through the context.
    Return(Option<Value>),
    /// The handler completes the invocation itself, through
    /// [`Context::done`] or the response facade.
    Explicit,
}

pub type HandlerResult = Result<HandlerOutcome, BoxError>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// An invocable function. Inputs arrive in binding declaration order.
pub type Handler = Arc<dyn Fn(Context, Vec<BindingSlot>) -> HandlerFuture + Send + Sync>;

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    handlers: HashMap<String, Handler>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under a function name, replacing any previous
    /// registration.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Context, Vec<BindingSlot>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handlers.insert(
            name.into(),
            Arc::new(move |context, inputs| Box::pin(handler(context, inputs))),
        );
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
