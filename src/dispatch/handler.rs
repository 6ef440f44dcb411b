//! The handler capability shared by middleware and route handlers.

use std::sync::Arc;

use crate::dispatch::context::Context;

/// A unit of request processing.
///
/// Middleware and terminal route handlers are the same thing: code that
/// receives the [`Context`] and may call [`Context::next`] to run the rest
/// of the chain. Any `Fn(&mut Context) + Send + Sync` closure is a handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut Context) {
        self(ctx)
    }
}

/// Shared, type-erased handler as stored in the router and in chains.
pub type BoxedHandler = Arc<dyn Handler>;

/// Erase a handler's concrete type.
pub fn boxed<H: Handler>(handler: H) -> BoxedHandler {
    Arc::new(handler)
}
