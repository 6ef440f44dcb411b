//! Panic recovery middleware.
//!
//! # Responsibilities
//! - Run the rest of the chain inside `catch_unwind`
//! - Log the panic message with the backtrace of the panic site
//! - Answer `500 Internal Server Error` instead of losing the request
//!
//! # Design Decisions
//! - The backtrace is captured by a panic hook (installed once, chained to
//!   the previous hook) because the stack is gone once unwinding finished
//! - The hook only captures while a recovery frame is active on the thread
//! - Handlers are not required to be `UnwindSafe`; the context is only used
//!   afterwards to write the error response

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use axum::http::StatusCode;

use crate::dispatch::{Context, Handler};

thread_local! {
    static LAST_PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
    static RECOVERY_DEPTH: Cell<usize> = const { Cell::new(0) };
}

static INSTALL_HOOK: Once = Once::new();

fn install_trace_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if RECOVERY_DEPTH.with(Cell::get) > 0 {
                LAST_PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            }
            previous(info);
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Converts panics raised further down the chain into a 500 response.
pub fn recovery() -> impl Handler {
    install_trace_hook();
    |ctx: &mut Context| {
        LAST_PANIC_TRACE.with(|slot| *slot.borrow_mut() = None);
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get() + 1));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| ctx.next()));
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get() - 1));

        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            let trace = LAST_PANIC_TRACE
                .with(|slot| slot.borrow_mut().take())
                .map(|bt| bt.to_string())
                .unwrap_or_default();
            tracing::error!(
                method = %ctx.method(),
                path = %ctx.path(),
                panic = %message,
                "Handler panicked\nTraceback:\n{trace}"
            );
            ctx.abort(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    }
}
