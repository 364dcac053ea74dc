//! Thread-scoped attachment of a resolution context.
//!
//! Framework callbacks with fixed signatures cannot receive the context as a
//! parameter. For those call sites the pass attaches its context to the
//! current thread; each thread sees only the context it attached itself, so
//! concurrent passes on different threads stay isolated.

use std::cell::RefCell;
use std::marker::PhantomData;

use tracing::debug;

use crate::catalog::ModelCatalog;
use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::localize::Localizer;
use crate::resolver::Resolver;
use crate::schema::Schema;
use crate::types::{Direction, TypeDescriptor};

thread_local! {
    static CURRENT: RefCell<Option<ResolutionContext>> = const { RefCell::new(None) };
}

/// Guard for a context attached to the current thread.
///
/// Dropping the guard detaches and discards the context, so a failed pass
/// never leaves its context behind.
#[must_use = "the context is detached when the guard is dropped"]
pub struct AttachedContext {
    // Attachment is per thread; the guard must not move to another one.
    _thread_bound: PhantomData<*const ()>,
}

/// Attach `context` to the current thread for the duration of a pass.
///
/// # Errors
///
/// Returns `ResolveError::ContextAlreadyAttached` if this thread already has
/// a context attached, or `ResolveError::ContextBusy` if it is in use.
pub fn attach(context: ResolutionContext) -> Result<AttachedContext, ResolveError> {
    CURRENT.with(|slot| {
        let mut slot = slot
            .try_borrow_mut()
            .map_err(|_| ResolveError::ContextBusy)?;
        if slot.is_some() {
            return Err(ResolveError::ContextAlreadyAttached);
        }
        *slot = Some(context);
        debug!("attached resolution context to thread");
        Ok(AttachedContext {
            _thread_bound: PhantomData,
        })
    })
}

impl AttachedContext {
    /// Detach and return the context.
    pub fn detach(self) -> Option<ResolutionContext> {
        take_current()
    }
}

impl Drop for AttachedContext {
    fn drop(&mut self) {
        if take_current().is_some() {
            debug!("discarded attached resolution context");
        }
    }
}

fn take_current() -> Option<ResolutionContext> {
    CURRENT
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
        .ok()
        .flatten()
}

/// Whether a context is attached to the current thread.
pub fn is_attached() -> bool {
    CURRENT.with(|slot| slot.try_borrow().map_or(true, |slot| slot.is_some()))
}

/// Run `f` against the context attached to the current thread.
///
/// # Errors
///
/// `NoActiveContext` if nothing is attached, `ContextBusy` when called from
/// inside another `with_current`, or whatever `f` returns.
pub fn with_current<T>(
    f: impl FnOnce(&mut ResolutionContext) -> Result<T, ResolveError>,
) -> Result<T, ResolveError> {
    CURRENT.with(|slot| {
        let mut slot = slot
            .try_borrow_mut()
            .map_err(|_| ResolveError::ContextBusy)?;
        match slot.as_mut() {
            Some(context) => f(context),
            None => Err(ResolveError::NoActiveContext),
        }
    })
}

/// Resolve a type against the context attached to the current thread.
pub fn resolve_type(
    catalog: &ModelCatalog,
    localizer: &dyn Localizer,
    ty: &TypeDescriptor,
    direction: Direction,
    explicit_name: Option<&str>,
) -> Result<Schema, ResolveError> {
    with_current(|context| {
        Resolver::new(catalog, context)
            .with_localizer(localizer)
            .resolve_type(ty, direction, explicit_name)
    })
}
