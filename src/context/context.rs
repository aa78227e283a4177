use std::collections::HashMap;
use std::sync::Arc;

use crate::vars::Vars;
use crate::Value;

/// Execution context carrying variables down a call chain.
///
/// Contexts are cheap to clone and never mutated in place: deriving
/// operations return a new context and leave the source untouched. A store
/// attached to a context is shared by every context derived from it.
///
/// # Examples
///
/// ```
/// use shared_vars::{attach_to_context, read_context_vars, Context, Vars};
///
/// let ctx = attach_to_context(&Context::background(), "$user", "alice");
///
/// let parent = Vars::new();
/// parent.set("$role", "admin");
///
/// let (ctx, vars) = parent.fork(&ctx);
/// assert_eq!(vars.get("$user"), Some("alice".into()));
/// assert_eq!(read_context_vars(&ctx).len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Context {
    vars: Option<Arc<Vars>>,
    ambient: Option<Arc<HashMap<String, Value>>>,
}

impl Context {
    /// An empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    /// The store carried by this context, if any.
    pub fn vars(&self) -> Option<&Arc<Vars>> {
        self.vars.as_ref()
    }

    /// Whether a store is attached.
    pub fn has_vars(&self) -> bool {
        self.vars.is_some()
    }

    pub(crate) fn ambient(&self) -> Option<&HashMap<String, Value>> {
        self.ambient.as_deref()
    }

    pub(crate) fn with_vars(&self, vars: Arc<Vars>) -> Self {
        Self {
            vars: Some(vars),
            ambient: self.ambient.clone(),
        }
    }

    fn with_ambient_var(&self, key: String, value: Value) -> Self {
        let mut ambient = self.ambient.clone().unwrap_or_default();
        // Copy-on-write: contexts sharing the map keep their own view.
        Arc::make_mut(&mut ambient).insert(key, value);

        Self {
            vars: self.vars.clone(),
            ambient: Some(ambient),
        }
    }
}

/// Two contexts are equal when they carry the same store instance and
/// ambient maps with equal contents.
impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        let same_vars = match (&self.vars, &other.vars) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_vars && self.ambient() == other.ambient()
    }
}

/// Add a variable to the context.
///
/// When the context carries a store, the variable is set on that store in
/// place (its observers fire) and the context is returned unchanged.
/// Otherwise a derived context is returned whose ambient map includes the
/// variable.
pub fn attach_to_context(
    ctx: &Context,
    key: impl Into<String>,
    value: impl Into<Value>,
) -> Context {
    if let Some(vars) = ctx.vars() {
        vars.set(key, value);
        return ctx.clone();
    }

    ctx.with_ambient_var(key.into(), value.into())
}

/// Variables visible through the context.
///
/// Returns a snapshot of the carried store when present, otherwise the
/// ambient map, otherwise an empty map.
pub fn read_context_vars(ctx: &Context) -> HashMap<String, Value> {
    if let Some(vars) = ctx.vars() {
        return vars.get_all();
    }

    ctx.ambient().cloned().unwrap_or_default()
}
