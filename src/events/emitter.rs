//! Generic, synchronous event emitter.
//!
//! [`EventEmitter`] keeps two disjoint sets of registrations: global ones,
//! which fire for every event kind, and per-kind ones, which fire only for
//! the kind they were registered under. Delivery goes through an injected
//! [`Applier`], the single seam that turns a generic emission into a call
//! on a concrete listener type.
//!
//! # Removal scoping
//!
//! [`EventEmitter::off`] only touches global registrations and
//! [`EventEmitter::off_event`] only touches registrations under one kind.
//! A listener added with `on_event` survives an `off`, and vice versa.
//!
//! # Re-entrancy
//!
//! The registry lock is never held while a listener runs. Each emission
//! delivers to a snapshot taken when the emission starts, so listeners may
//! call `on`/`off`/`emit` on the same emitter. A listener removed during an
//! emission still receives that emission, unless it was a `once`
//! registration that had not fired yet; one added during it does not.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use super::ListenerId;

/// Delivers one emitted payload to one listener.
///
/// Implementations map the generic `(listener, kind, payload)` triple onto
/// the strongly typed callback of their listener interface. An error
/// returned here aborts the rest of the emission and is handed back to the
/// caller of [`EventEmitter::emit`].
pub trait Applier<K, L: ?Sized, P: ?Sized> {
    /// Error raised by a failed delivery.
    type Error;

    /// Invokes `listener` for an emission of `kind` carrying `payload`.
    ///
    /// # Errors
    ///
    /// Returns whatever the concrete listener interface reports as failure.
    fn apply(&self, listener: &L, kind: &K, payload: &P) -> Result<(), Self::Error>;
}

/// Plain closure listener receiving the event kind and payload.
pub type Callback<K, P> = dyn Fn(&K, &P) + Send + Sync + 'static;

/// [`Applier`] for [`Callback`] listeners. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackApplier;

impl<K: 'static, P: ?Sized + 'static> Applier<K, Callback<K, P>, P> for CallbackApplier {
    type Error = Infallible;

    fn apply(&self, listener: &Callback<K, P>, kind: &K, payload: &P) -> Result<(), Infallible> {
        listener(kind, payload);
        Ok(())
    }
}

/// Emitter whose listeners are plain closures.
pub type CallbackEmitter<K, P> = EventEmitter<K, Callback<K, P>, P, CallbackApplier>;

struct Registration<L: ?Sized> {
    id: ListenerId,
    listener: Arc<L>,
    once: bool,
}

impl<L: ?Sized> Registration<L> {
    fn new(listener: Arc<L>, once: bool) -> Self {
        Self {
            id: ListenerId::new(),
            listener,
            once,
        }
    }

    fn is(&self, listener: &Arc<L>) -> bool {
        Arc::ptr_eq(&self.listener, listener)
    }
}

/// One entry of an emission snapshot.
struct Target<L: ?Sized> {
    id: ListenerId,
    listener: Arc<L>,
    once: bool,
}

impl<L: ?Sized> From<&Registration<L>> for Target<L> {
    fn from(registration: &Registration<L>) -> Self {
        Self {
            id: registration.id,
            listener: Arc::clone(&registration.listener),
            once: registration.once,
        }
    }
}

struct Registry<K, L: ?Sized> {
    global: Vec<Registration<L>>,
    by_event: HashMap<K, Vec<Registration<L>>>,
}

impl<K, L: ?Sized> Default for Registry<K, L> {
    fn default() -> Self {
        Self {
            global: Vec::new(),
            by_event: HashMap::new(),
        }
    }
}

/// Registry of listeners with synchronous dispatch.
///
/// `K` is the event kind, `L` the listener interface (usually a trait
/// object), `P` the payload passed to [`emit`](Self::emit) and `A` the
/// [`Applier`] that connects them. Listeners are held as `Arc<L>` and are
/// identified by pointer for removal; the emitter never owns their
/// lifecycle beyond the reference it keeps while registered.
///
/// # Concurrency
///
/// A single [`parking_lot::Mutex`] guards both the global list and the
/// per-kind map. Callbacks run on the emitting thread after the lock has
/// been released.
pub struct EventEmitter<K, L: ?Sized, P: ?Sized, A> {
    registry: Mutex<Registry<K, L>>,
    applier: A,
    _payload: PhantomData<fn(&P)>,
}

impl<K, L, P, A> EventEmitter<K, L, P, A>
where
    K: Eq + Hash + fmt::Debug,
    L: ?Sized,
    P: ?Sized,
    A: Applier<K, L, P>,
{
    /// Creates an empty emitter delivering through `applier`.
    #[must_use]
    pub fn new(applier: A) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            applier,
            _payload: PhantomData,
        }
    }

    /// Returns the applier this emitter delivers through.
    #[must_use]
    pub const fn applier(&self) -> &A {
        &self.applier
    }

    /// Registers `listener` for every event kind.
    ///
    /// Registering the same listener twice produces two firings per emission.
    pub fn on(&self, listener: Arc<L>) -> ListenerId {
        let registration = Registration::new(listener, false);
        let id = registration.id;
        self.registry.lock().global.push(registration);
        id
    }

    /// Registers `listener` for `kind` only.
    pub fn on_event(&self, kind: K, listener: Arc<L>) -> ListenerId {
        self.register(kind, listener, false)
    }

    /// Registers `listener` for the next emission of `kind` only.
    ///
    /// The registration is removed before the listener is invoked, so it
    /// fires at most once even if the listener emits `kind` again. It stays
    /// in place for as long as no matching emission happens.
    pub fn once(&self, kind: K, listener: Arc<L>) -> ListenerId {
        self.register(kind, listener, true)
    }

    fn register(&self, kind: K, listener: Arc<L>, once: bool) -> ListenerId {
        let registration = Registration::new(listener, once);
        let id = registration.id;
        self.registry
            .lock()
            .by_event
            .entry(kind)
            .or_default()
            .push(registration);
        id
    }

    /// Removes every global registration of `listener`.
    ///
    /// Registrations made with [`on_event`](Self::on_event) or
    /// [`once`](Self::once) are left untouched. Returns the number of
    /// registrations removed.
    pub fn off(&self, listener: &Arc<L>) -> usize {
        let mut registry = self.registry.lock();
        let before = registry.global.len();
        registry.global.retain(|r| !r.is(listener));
        let removed = before - registry.global.len();
        tracing::debug!(removed, "global listener removed");
        removed
    }

    /// Removes every registration of `listener` under `kind`, including
    /// pending `once` registrations.
    ///
    /// Global registrations of the same listener are left untouched.
    /// Returns the number of registrations removed.
    pub fn off_event(&self, kind: &K, listener: &Arc<L>) -> usize {
        let mut registry = self.registry.lock();
        let Some(registrations) = registry.by_event.get_mut(kind) else {
            return 0;
        };
        let before = registrations.len();
        registrations.retain(|r| !r.is(listener));
        let removed = before - registrations.len();
        let now_empty = registrations.is_empty();
        if now_empty {
            registry.by_event.remove(kind);
        }
        tracing::debug!(?kind, removed, "event listener removed");
        removed
    }

    /// Removes the single registration identified by `id`, wherever it lives.
    ///
    /// Returns `false` if no such registration exists (already removed, or a
    /// `once` registration that has fired).
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.lock();
        if let Some(pos) = registry.global.iter().position(|r| r.id == id) {
            registry.global.remove(pos);
            return true;
        }
        let mut found = false;
        for registrations in registry.by_event.values_mut() {
            if let Some(pos) = registrations.iter().position(|r| r.id == id) {
                registrations.remove(pos);
                found = true;
                break;
            }
        }
        if found {
            registry
                .by_event
                .retain(|_, registrations| !registrations.is_empty());
        }
        found
    }

    /// Removes every registration, global and per-kind.
    pub fn off_all(&self) {
        let mut registry = self.registry.lock();
        registry.global.clear();
        registry.by_event.clear();
    }

    /// Returns the number of global registrations.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.lock().global.len()
    }

    /// Returns the number of registrations under `kind`, excluding globals.
    #[must_use]
    pub fn event_listener_count(&self, kind: &K) -> usize {
        self.registry.lock().by_event.get(kind).map_or(0, Vec::len)
    }

    /// Delivers `payload` for `kind` to every matching listener.
    ///
    /// Global listeners run first, then listeners registered for `kind`,
    /// each group in registration order. A `once` registration is dropped
    /// from the registry immediately before its listener runs; if it is
    /// already gone by then (removed, or consumed by a concurrent
    /// emission) the listener is skipped.
    ///
    /// # Errors
    ///
    /// The first error returned by the applier stops delivery; listeners
    /// later in the order are not invoked for this emission, and their
    /// `once` registrations stay pending.
    pub fn emit(&self, kind: &K, payload: &P) -> Result<(), A::Error> {
        let registry = self.registry.lock();
        let targets: Vec<Target<L>> = registry
            .global
            .iter()
            .chain(registry.by_event.get(kind).into_iter().flatten())
            .map(Target::from)
            .collect();
        drop(registry);

        tracing::trace!(?kind, listeners = targets.len(), "emitting event");
        for target in &targets {
            if target.once && !self.take_once(kind, target.id) {
                continue;
            }
            self.applier.apply(target.listener.as_ref(), kind, payload)?;
        }
        Ok(())
    }

    /// Removes the pending `once` registration `id` under `kind`.
    ///
    /// Returns `false` if it is no longer registered.
    fn take_once(&self, kind: &K, id: ListenerId) -> bool {
        let mut registry = self.registry.lock();
        let Some(registrations) = registry.by_event.get_mut(kind) else {
            return false;
        };
        let Some(pos) = registrations.iter().position(|r| r.id == id) else {
            return false;
        };
        registrations.remove(pos);
        let now_empty = registrations.is_empty();
        if now_empty {
            registry.by_event.remove(kind);
        }
        true
    }
}

impl<K, L, P, A> Default for EventEmitter<K, L, P, A>
where
    K: Eq + Hash + fmt::Debug,
    L: ?Sized,
    P: ?Sized,
    A: Applier<K, L, P> + Default,
{
    fn default() -> Self {
        Self::new(A::default())
    }
}

impl<K, L, P, A> fmt::Debug for EventEmitter<K, L, P, A>
where
    K: fmt::Debug,
    L: ?Sized,
    P: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        let per_event: Vec<(&K, usize)> = registry
            .by_event
            .iter()
            .map(|(kind, registrations)| (kind, registrations.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("global", &registry.global.len())
            .field("per_event", &per_event)
            .finish_non_exhaustive()
    }
}
