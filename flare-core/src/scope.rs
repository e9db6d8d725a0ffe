//! Per-scope event accounting.
//!
//! A scope is a caller-defined unit of work (one request, one job). Each scope
//! counts every admission attempt and enforces the configured ceiling:
//!
//! | attempt `n` (ceiling `m > 0`) | result |
//! |---|---|
//! | `n < m` | [`Admission::Accepted`] |
//! | `n == m` | [`Admission::AcceptedWithCeilingWarning`] (once) |
//! | `n > m` | [`Admission::Rejected`] |
//!
//! A ceiling of `0` disables the limit. Child scopes keep their own counters
//! but share the request context of the scope they were opened from.
//!
//! Scopes are passed explicitly. [`Scope::enter`] additionally installs a scope
//! as the current thread's ambient default until the returned guard drops.

use core::cell::RefCell;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Outcome of asking a scope to admit one more event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Report the event
    Accepted,
    /// Report the event, emit the one-time ceiling diagnostic, accept no more
    AcceptedWithCeilingWarning,
    /// Ceiling exceeded; drop the event
    Rejected,
}

impl Admission {
    /// Whether the event should be reported.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Admission::Rejected)
    }
}

/// HTTP attributes captured from the request being served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpAttributes {
    pub request_id: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub status_code: Option<u16>,
    pub scheme: Option<String>,
    pub protocol: Option<String>,
}

/// Execution context shared by a scope and every scope opened inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Unix seconds when the context was created
    pub timestamp: u64,
    /// Filled in once an HTTP request is known
    pub http: Option<HttpAttributes>,
}

impl RequestContext {
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            http: None,
        }
    }

    pub fn with_http(mut self, http: HttpAttributes) -> Self {
        self.http = Some(http);
        self
    }
}

/// Counter state of one logical scope.
#[derive(Debug)]
pub struct ScopeState {
    name: String,
    attempted: AtomicU64,
    ceiling_warned: AtomicBool,
    context: Arc<Mutex<RequestContext>>,
}

impl ScopeState {
    fn new(name: String, context: Arc<Mutex<RequestContext>>) -> Self {
        Self {
            name,
            attempted: AtomicU64::new(0),
            ceiling_warned: AtomicBool::new(false),
            context,
        }
    }

    /// Count one attempt and decide whether it may be reported.
    pub fn admit(&self, max_events: u32) -> Admission {
        let attempt = self.attempted.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        if max_events == 0 {
            return Admission::Accepted;
        }

        let ceiling = u64::from(max_events);
        if attempt < ceiling {
            Admission::Accepted
        } else if attempt == ceiling && !self.ceiling_warned.swap(true, Ordering::AcqRel) {
            Admission::AcceptedWithCeilingWarning
        } else {
            Admission::Rejected
        }
    }

    /// Attempts seen so far, rejected ones included.
    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::Acquire)
    }

    /// Whether the ceiling diagnostic has been handed out.
    pub fn ceiling_warned(&self) -> bool {
        self.ceiling_warned.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Shared handle to a [`ScopeState`].
#[derive(Debug, Clone)]
pub struct Scope {
    state: Arc<ScopeState>,
}

impl Scope {
    /// Open a top-level scope with a fresh request context.
    pub fn root(name: impl Into<String>, context: RequestContext) -> Self {
        Self {
            state: Arc::new(ScopeState::new(
                name.into(),
                Arc::new(Mutex::new(context)),
            )),
        }
    }

    /// Open a nested scope: own counter, parent's request context.
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            state: Arc::new(ScopeState::new(
                name.into(),
                Arc::clone(&self.state.context),
            )),
        }
    }

    pub fn admit(&self, max_events: u32) -> Admission {
        self.state.admit(max_events)
    }

    pub fn state(&self) -> &ScopeState {
        &self.state
    }

    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Snapshot of the shared request context.
    pub fn context(&self) -> RequestContext {
        self.state
            .context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutate the request context seen by this scope and its relatives.
    pub fn update_context<F>(&self, f: F)
    where
        F: FnOnce(&mut RequestContext),
    {
        let mut context = self
            .state
            .context
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut context);
    }

    /// Whether both handles refer to the same scope.
    pub fn same_scope(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Make this scope the current thread's ambient scope until the guard drops.
    pub fn enter(&self) -> ScopeGuard {
        AMBIENT.with(|stack| stack.borrow_mut().push(self.clone()));
        ScopeGuard {
            scope: self.clone(),
            _not_send: PhantomData,
        }
    }

    /// Innermost scope entered on this thread, if any.
    pub fn current() -> Option<Scope> {
        AMBIENT.with(|stack| stack.borrow().last().cloned())
    }
}

thread_local! {
    static AMBIENT: RefCell<Vec<Scope>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a scope installed as the ambient default; pops it on drop.
#[must_use = "the scope is exited as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScopeGuard {
    scope: Scope,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        AMBIENT.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|s| s.same_scope(&self.scope)) {
                stack.remove(pos);
            }
        });
    }
}
