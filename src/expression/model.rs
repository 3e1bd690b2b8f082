//! Models an expression reads from, and change subscriptions on them.
//!
//! A [`Model`] resolves attribute paths and lets callers subscribe to changes.
//! [`JsonModel`] is the stock implementation over a `serde_json::Value`.
//! Everything here is single threaded; callbacks run synchronously inside
//! [`JsonModel::set`] in registration order.

use super::model_path::Namespace;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Called with the subscribed path and its value after a change.
pub type Callback = Box<dyn FnMut(&[String], &serde_json::Value)>;

/// Resolver interface every namespace object implements.
pub trait Model {
    /// Value at `path`, `None` when any segment is missing.
    fn get(&self, path: &[String]) -> Option<serde_json::Value>;

    /// Register `callback` for changes at, above or below `path`.
    fn subscribe(&self, path: &[String], callback: Callback) -> Subscription;
}

/// Unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Subscription {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel, for models that never change.
    pub fn inert() -> Subscription {
        Subscription { cancel: None }
    }

    /// Unsubscribe now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// The subscriptions owned by one consumer. Dropping the set unsubscribes all.
#[derive(Debug, Default)]
pub struct ListenerSet {
    subscriptions: Vec<Subscription>,
}

impl ListenerSet {
    pub fn new() -> ListenerSet {
        ListenerSet::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Unsubscribe everything now, keeping the set for reuse.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

struct Listener {
    id: u64,
    path: Vec<String>,
    callback: Rc<RefCell<Callback>>,
}

#[derive(Default)]
struct ModelState {
    data: serde_json::Value,
    listeners: Vec<Listener>,
    next_id: u64,
}

/// A mutable JSON document with per-path change notification.
///
/// Clones share the same document and listeners.
#[derive(Clone, Default)]
pub struct JsonModel {
    state: Rc<RefCell<ModelState>>,
}

impl JsonModel {
    pub fn new(data: serde_json::Value) -> JsonModel {
        JsonModel {
            state: Rc::new(RefCell::new(ModelState {
                data,
                ..Default::default()
            })),
        }
    }

    /// Snapshot of the whole document.
    pub fn data(&self) -> serde_json::Value {
        self.state.borrow().data.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Set the value at a dotted path and notify affected listeners.
    pub fn set(&self, path: &str, value: serde_json::Value) {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        self.set_path(&segments, value);
    }

    /// Set the value at `path`, creating objects along the way.
    pub fn set_path(&self, path: &[String], value: serde_json::Value) {
        let pending = {
            let mut state = self.state.borrow_mut();
            write_nested(&mut state.data, path, value);
            let pending: Vec<_> = state
                .listeners
                .iter()
                .filter(|listener| related(&listener.path, path))
                .map(|listener| {
                    let current = lookup(&state.data, &listener.path)
                        .cloned()
                        .unwrap_or(serde_json::Value::Null);
                    (
                        listener.path.clone(),
                        current,
                        Rc::clone(&listener.callback),
                    )
                })
                .collect();
            pending
        };
        log::trace!("set {} -> {} listener(s)", path.join("."), pending.len());
        // no borrow is held here so callbacks may read or write the model
        for (listener_path, current, callback) in pending {
            match callback.try_borrow_mut() {
                Ok(mut callback) => (callback)(&listener_path, &current),
                Err(_) => log::debug!(
                    "skipping re-entrant notification for {}",
                    listener_path.join(".")
                ),
            }
        }
    }
}

impl Model for JsonModel {
    fn get(&self, path: &[String]) -> Option<serde_json::Value> {
        lookup(&self.state.borrow().data, path).cloned()
    }

    fn subscribe(&self, path: &[String], callback: Callback) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push(Listener {
                id,
                path: path.to_vec(),
                callback: Rc::new(RefCell::new(callback)),
            });
            id
        };
        let weak: Weak<RefCell<ModelState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                if let Ok(mut state) = state.try_borrow_mut() {
                    state.listeners.retain(|listener| listener.id != id);
                }
            }
        })
    }
}

impl fmt::Debug for JsonModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("JsonModel")
            .field("data", &state.data)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

/// One path is an ancestor of, a descendant of, or equal to the other.
fn related(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

fn lookup<'a>(data: &'a serde_json::Value, path: &[String]) -> Option<&'a serde_json::Value> {
    path.iter().try_fold(data, |node, segment| match node {
        serde_json::Value::Object(map) => map.get(segment),
        serde_json::Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn write_nested(data: &mut serde_json::Value, path: &[String], value: serde_json::Value) {
    let Some((last, parents)) = path.split_last() else {
        *data = value;
        return;
    };
    let mut node = data;
    for segment in parents {
        if !node.is_object() {
            *node = serde_json::Value::Object(serde_json::Map::new());
        }
        let serde_json::Value::Object(map) = node else {
            return;
        };
        node = map
            .entry(segment.clone())
            .or_insert(serde_json::Value::Null);
    }
    if let serde_json::Value::Array(items) = node {
        if let Some(slot) = last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            *slot = value;
            return;
        }
    }
    if !node.is_object() {
        *node = serde_json::Value::Object(serde_json::Map::new());
    }
    if let serde_json::Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

/// Registry of models keyed by namespace.
#[derive(Clone, Default)]
pub struct Models {
    models: BTreeMap<Namespace, Rc<dyn Model>>,
}

impl Models {
    pub fn new() -> Models {
        Models::default()
    }

    pub fn insert(&mut self, namespace: Namespace, model: Rc<dyn Model>) {
        self.models.insert(namespace, model);
    }

    /// Builder form of [`Models::insert`].
    pub fn with(mut self, namespace: Namespace, model: impl Model + 'static) -> Models {
        self.insert(namespace, Rc::new(model));
        self
    }

    pub fn get(&self, namespace: &Namespace) -> Option<&Rc<dyn Model>> {
        self.models.get(namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.models.keys()
    }
}

impl fmt::Debug for Models {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.models.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn segments(path: &str) -> Vec<String> {
        path.split('.').map(str::to_string).collect()
    }

    #[test]
    fn test_get_nested() {
        let model = JsonModel::new(json!({"a": {"b": [10, {"c": "x"}]}}));
        assert_eq!(model.get(&segments("a.b.0")), Some(json!(10)));
        assert_eq!(model.get(&segments("a.b.1.c")), Some(json!("x")));
        assert_eq!(model.get(&segments("a.missing")), None);
        assert_eq!(model.get(&segments("a.b.7")), None);
        assert_eq!(model.get(&[]), Some(model.data()));
    }

    #[test]
    fn test_set_creates_objects() {
        let model = JsonModel::new(json!({}));
        model.set("common.debug.value", json!(true));
        assert_eq!(model.data(), json!({"common": {"debug": {"value": true}}}));
        model.set("list", json!([1, 2]));
        model.set("list.1", json!(5));
        assert_eq!(model.get(&segments("list")), Some(json!([1, 5])));
    }

    #[test]
    fn test_subscribe_notifies_related_paths() {
        let model = JsonModel::new(json!({"a": {"b": 1}, "z": 0}));
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(json!(null)));

        let hits_clone = Rc::clone(&hits);
        let seen_clone = Rc::clone(&seen);
        let _sub = model.subscribe(
            &segments("a.b"),
            Box::new(move |_, value| {
                hits_clone.set(hits_clone.get() + 1);
                *seen_clone.borrow_mut() = value.clone();
            }),
        );

        model.set("a.b", json!(2));
        model.set("a", json!({"b": 3}));
        model.set("z", json!(1));
        assert_eq!(hits.get(), 2, "unrelated path must not notify");
        assert_eq!(*seen.borrow(), json!(3));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let model = JsonModel::new(json!({"a": 1}));
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        let sub = model.subscribe(
            &segments("a"),
            Box::new(move |_, _| hits_clone.set(hits_clone.get() + 1)),
        );
        assert_eq!(model.listener_count(), 1);
        model.set("a", json!(2));
        drop(sub);
        assert_eq!(model.listener_count(), 0);
        model.set("a", json!(3));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_set_clear() {
        let model = JsonModel::new(json!({"a": 1}));
        let mut set = ListenerSet::new();
        set.push(model.subscribe(&segments("a"), Box::new(|_, _| {})));
        set.push(model.subscribe(&segments("a"), Box::new(|_, _| {})));
        assert_eq!(set.len(), 2);
        assert_eq!(model.listener_count(), 2);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(model.listener_count(), 0);
    }

    #[test]
    fn test_callback_may_write_model() {
        let model = JsonModel::new(json!({"a": 1, "b": 0}));
        let writer = model.clone();
        let _sub = model.subscribe(
            &segments("a"),
            Box::new(move |_, value| writer.set("b", value.clone())),
        );
        model.set("a", json!(7));
        assert_eq!(model.get(&segments("b")), Some(json!(7)));
    }

    #[test]
    fn test_models_registry() {
        let models = Models::new()
            .with(Namespace::Settings, JsonModel::new(json!({})))
            .with(Namespace::Cluster, JsonModel::new(json!({})));
        assert!(models.get(&Namespace::Settings).is_some());
        assert!(models.get(&Namespace::Version).is_none());
        assert_eq!(models.namespaces().count(), 2);
    }
}
