//! Per-entity change channels.
//!
//! Every entity owns a [`Subscribers`] list with two parts: handles of other
//! entities in the same store whose derived state depends on it (an edge on
//! its vertices, a polygon on its edges and boundary conditions, a mesh on
//! its polygons), and external listeners registered by callers. The store
//! walks the internal part to recompute derived state, then calls the
//! external listeners.

use std::fmt;
use std::rc::Rc;

use crate::entity::EntityKey;
use crate::topology::store::MeshStore;

/// Receives a callback each time an observed entity changes.
///
/// Called synchronously from inside the mutating store method, after every
/// derived value (edge lengths and so on) has been brought up to date.
pub trait UpdateListener {
    fn update(&self, store: &MeshStore, source: EntityKey);
}

impl<F> UpdateListener for F
where
    F: Fn(&MeshStore, EntityKey),
{
    fn update(&self, store: &MeshStore, source: EntityKey) {
        self(store, source)
    }
}

/// Wrap a closure as a shareable listener.
pub fn listener(f: impl Fn(&MeshStore, EntityKey) + 'static) -> Rc<dyn UpdateListener> {
    Rc::new(f)
}

fn same_listener(a: &Rc<dyn UpdateListener>, b: &Rc<dyn UpdateListener>) -> bool {
    // Compare data pointers only; vtable pointers are not unique.
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Subscriber list of one entity.
///
/// Cloning yields an empty list: a copied entity starts with no observers,
/// and stores rebuild their internal wiring after a clone or a load.
#[derive(Default)]
pub struct Subscribers {
    dependents: Vec<EntityKey>,
    listeners: Vec<Rc<dyn UpdateListener>>,
}

impl Subscribers {
    /// Add a dependent entity. Returns false if it was already subscribed.
    pub(crate) fn subscribe(&mut self, key: EntityKey) -> bool {
        if self.dependents.contains(&key) {
            return false;
        }
        self.dependents.push(key);
        true
    }

    pub(crate) fn unsubscribe(&mut self, key: EntityKey) -> bool {
        let before = self.dependents.len();
        self.dependents.retain(|k| *k != key);
        self.dependents.len() != before
    }

    pub(crate) fn clear_dependents(&mut self) {
        self.dependents.clear();
    }

    /// Dependent entities, in subscription order.
    pub fn dependents(&self) -> &[EntityKey] {
        &self.dependents
    }

    /// Add an external listener. The same `Rc` is only held once.
    pub(crate) fn register(&mut self, listener: Rc<dyn UpdateListener>) -> bool {
        if self.listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    pub(crate) fn unregister(&mut self, listener: &Rc<dyn UpdateListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !same_listener(l, listener));
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Snapshot of the listeners, so callbacks can run while the list is
    /// borrowed elsewhere.
    pub(crate) fn listeners(&self) -> Vec<Rc<dyn UpdateListener>> {
        self.listeners.clone()
    }
}

impl Clone for Subscribers {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("dependents", &self.dependents)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::store::PolygonId;

    #[test]
    fn test_register_deduplicates() {
        let mut subs = Subscribers::default();
        let l = listener(|_, _| {});
        assert!(subs.register(l.clone()));
        assert!(!subs.register(l.clone()));
        assert_eq!(subs.listener_count(), 1);
        assert!(subs.unregister(&l));
        assert!(!subs.unregister(&l));
        assert_eq!(subs.listener_count(), 0);
    }

    #[test]
    fn test_distinct_listeners_both_kept() {
        let mut subs = Subscribers::default();
        assert!(subs.register(listener(|_, _| {})));
        assert!(subs.register(listener(|_, _| {})));
        assert_eq!(subs.listener_count(), 2);
    }

    #[test]
    fn test_clone_is_empty() {
        let mut subs = Subscribers::default();
        subs.subscribe(EntityKey::Polygon(PolygonId::default()));
        subs.register(listener(|_, _| {}));
        let copy = subs.clone();
        assert!(copy.dependents().is_empty());
        assert_eq!(copy.listener_count(), 0);
    }
}
