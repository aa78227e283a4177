use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{effective_prefix, VarsConfig};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::Value;

type Observer = Box<dyn Fn(&str, &Value) + Send + Sync>;

#[derive(Default)]
struct VarsInner {
    values: HashMap<String, Value>,
    on_set: Vec<Observer>,
}

/// A thread-safe store of named variables.
///
/// Share it as `Arc<Vars>`; every operation takes `&self`. Values and
/// observers live behind one mutex, so writes, resets and observer
/// registration are totally ordered. The prefix is fixed at construction.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use shared_vars::Vars;
///
/// let vars = Vars::new();
/// vars.set("$id1", 42);
///
/// assert!(vars.is_var("$id1"));
/// assert_eq!(vars.get("$id1"), Some(json!(42)));
/// assert_eq!(vars.get("$missing"), None);
/// ```
#[derive(Default)]
pub struct Vars {
    prefix: String,
    inner: Mutex<VarsInner>,
}

impl Vars {
    /// Create an empty store using the default `$` prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store recognizing variables by `prefix`.
    ///
    /// An empty prefix means the default `$`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            inner: Mutex::default(),
        }
    }

    /// Create an empty store from validated configuration.
    pub fn from_config(config: &VarsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_prefix(config.prefix.clone()))
    }

    /// The prefix in effect.
    pub fn prefix(&self) -> &str {
        effective_prefix(&self.prefix)
    }

    /// Remove all variables and all observers.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        debug!(
            values = inner.values.len(),
            observers = inner.on_set.len(),
            "resetting vars"
        );
        inner.values = HashMap::new();
        inner.on_set = Vec::new();
    }

    /// Check if a string looks like a variable name.
    pub fn is_var(&self, s: &str) -> bool {
        s.starts_with(self.prefix())
    }

    /// Get a copy of a variable's value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().values.get(key).cloned()
    }

    /// Set a variable, then notify observers in registration order.
    ///
    /// Observers run while the store lock is held. An observer must not call
    /// back into this store or it will deadlock.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        trace!(key = %key, observers = inner.on_set.len(), "setting var");
        inner.values.insert(key.clone(), value.into());

        if let Some(value) = inner.values.get(&key) {
            for observer in &inner.on_set {
                observer(&key, value);
            }
        }
    }

    /// Register a callback to invoke whenever a variable is set.
    ///
    /// Callbacks are not deduplicated and are all removed on [`reset`].
    /// The callback runs under the store lock and must not call back into
    /// this store.
    ///
    /// [`reset`]: Vars::reset
    pub fn on_set<F>(&self, callback: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.inner.lock().on_set.push(Box::new(callback));
    }

    /// Get an independent copy of all variables.
    pub fn get_all(&self) -> HashMap<String, Value> {
        self.inner.lock().values.clone()
    }

    /// Number of variables currently set.
    pub fn len(&self) -> usize {
        self.inner.lock().values.len()
    }

    /// Whether no variables are set.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().values.is_empty()
    }

    /// Decode a variable into `T`.
    ///
    /// Returns `Ok(None)` when the variable is not set.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|source| Error::Decode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Encode `value` and set it like [`set`](Vars::set).
    pub fn set_as<T>(&self, key: impl Into<String>, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|source| Error::Encode {
            key: key.clone(),
            source,
        })?;
        self.set(key, value);
        Ok(())
    }

    /// Value of `s` if it is a variable name with a value.
    pub fn resolve(&self, s: &str) -> Option<Value> {
        if !self.is_var(s) {
            return None;
        }
        self.get(s)
    }

    /// Replace every known variable name in `text` with its value.
    ///
    /// Strings are inserted as is, other values in their JSON form. Longer
    /// names take precedence, so `$id10` is not read as `$id1` followed by
    /// `0`. Substituted values are not scanned again.
    pub fn replace_all(&self, text: &str) -> String {
        let prefix = self.prefix();
        if !text.contains(prefix) {
            return text.to_string();
        }

        let values = self.get_all();
        let mut names: Vec<&str> = values
            .keys()
            .map(String::as_str)
            .filter(|name| self.is_var(name) && text.contains(name))
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        'scan: while let Some(ch) = rest.chars().next() {
            if rest.starts_with(prefix) {
                for name in &names {
                    if rest.starts_with(name) {
                        match &values[*name] {
                            Value::String(s) => out.push_str(s),
                            other => out.push_str(&other.to_string()),
                        }
                        rest = &rest[name.len()..];
                        continue 'scan;
                    }
                }
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }

        out
    }

    /// Instrument `ctx` with a copy of this store, or return the store the
    /// context already carries.
    ///
    /// See [`fork_from`](Vars::fork_from).
    pub fn fork(&self, ctx: &Context) -> (Context, Arc<Vars>) {
        Self::fork_from(Some(self), ctx)
    }

    /// Instrument `ctx` with a copy of `parent`, or return the store the
    /// context already carries.
    ///
    /// A context that carries a store is returned unchanged together with
    /// that same store. Otherwise the new store takes the parent's prefix and
    /// a snapshot of its values, then any ambient context variables whose
    /// names the snapshot lacks. Observers are not inherited. A `None` parent
    /// forks as an empty store with the default prefix.
    pub fn fork_from(parent: Option<&Vars>, ctx: &Context) -> (Context, Arc<Vars>) {
        if let Some(existing) = ctx.vars() {
            debug!("context already carries vars, fork is a no-op");
            return (ctx.clone(), Arc::clone(existing));
        }

        let (prefix, mut values) = match parent {
            Some(parent) => (parent.prefix.clone(), parent.get_all()),
            None => (String::new(), HashMap::new()),
        };
        let inherited = values.len();

        let mut filled = 0;
        if let Some(ambient) = ctx.ambient() {
            for (key, value) in ambient {
                if !values.contains_key(key) {
                    values.insert(key.clone(), value.clone());
                    filled += 1;
                }
            }
        }

        debug!(inherited, filled, "forked vars into context");

        let forked = Arc::new(Vars {
            prefix,
            inner: Mutex::new(VarsInner {
                values,
                on_set: Vec::new(),
            }),
        });

        (ctx.with_vars(Arc::clone(&forked)), forked)
    }
}

impl fmt::Debug for Vars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Vars")
            .field("prefix", &self.prefix())
            .field("values", &inner.values)
            .field("observers", &inner.on_set.len())
            .finish()
    }
}
