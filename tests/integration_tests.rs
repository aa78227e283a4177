//! Integration tests for shared-vars

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::thread;

use serde_json::json;
use shared_vars::{attach_to_context, read_context_vars, Context, Value, Vars};

#[test]
fn concurrent_forks_stay_independent() {
    let parent = Vars::new();
    parent.set("k", "v");
    let expected_parent = HashMap::from([("k".to_string(), json!("v"))]);

    thread::scope(|s| {
        for i in 0..50 {
            let parent = &parent;
            let expected_parent = &expected_parent;

            s.spawn(move || {
                let (ctx, vi) = parent.fork(&Context::background());

                assert_eq!(vi.get_all(), *expected_parent);
                vi.set("ki", i);
                assert_eq!(
                    vi.get_all(),
                    HashMap::from([("k".to_string(), json!("v")), ("ki".to_string(), json!(i))])
                );
                vi.set("k", i);
                assert_eq!(
                    vi.get_all(),
                    HashMap::from([("k".to_string(), json!(i)), ("ki".to_string(), json!(i))])
                );

                // Forking with already instrumented context is a no op.
                let (ctx2, vi2) = parent.fork(&ctx);
                assert_eq!(ctx, ctx2);
                assert!(Arc::ptr_eq(&vi, &vi2));

                assert_eq!(parent.get_all(), *expected_parent);
            });
        }
    });

    assert_eq!(parent.get_all(), expected_parent);
}

#[test]
fn concurrent_sets_are_all_observed() {
    let vars = Arc::new(Vars::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    vars.on_set(move |_, _| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    });

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let vars = Arc::clone(&vars);
            thread::spawn(move || {
                for i in 0..100 {
                    vars.set(format!("$t{t}_{i}"), i);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(vars.len(), 800);
    assert_eq!(calls.load(Ordering::SeqCst), 800);
    assert_eq!(vars.get("$t3_42"), Some(json!(42)));
}

#[test]
fn reset_races_with_writers() {
    let vars = Arc::new(Vars::new());

    thread::scope(|s| {
        for t in 0..4 {
            let vars = Arc::clone(&vars);
            s.spawn(move || {
                for i in 0..200 {
                    vars.set(format!("$k{t}"), i);
                    let _ = vars.get_all();
                }
            });
        }
        let vars = Arc::clone(&vars);
        s.spawn(move || {
            for _ in 0..50 {
                vars.reset();
            }
        });
    });

    // Every surviving value is the complete write of some thread.
    for (key, value) in vars.get_all() {
        assert!(key.starts_with("$k"));
        assert!(value.is_u64());
    }

    vars.reset();
    assert!(vars.get_all().is_empty());
}

#[test]
fn context_flow_through_call_chain() {
    fn middleware(ctx: &Context) -> Context {
        attach_to_context(ctx, "$request_id", "req-1")
    }

    fn handler(defaults: &Vars, ctx: &Context) -> HashMap<String, Value> {
        let (ctx, vars) = defaults.fork(ctx);
        let ctx = attach_to_context(&ctx, "$status", 200);
        inner_step(&ctx);
        vars.get_all()
    }

    fn inner_step(ctx: &Context) {
        let vars = ctx.vars().expect("handler instruments the context");
        let id = vars.get("$request_id").unwrap();
        vars.set("$trace", json!(format!("trace-{}", id.as_str().unwrap())));
    }

    let defaults = Vars::new();
    defaults.set("$status", 0);
    defaults.set("$region", "eu");

    let ctx = middleware(&Context::background());
    let seen = handler(&defaults, &ctx);

    assert_eq!(
        seen,
        HashMap::from([
            ("$request_id".to_string(), json!("req-1")),
            ("$status".to_string(), json!(200)),
            ("$region".to_string(), json!("eu")),
            ("$trace".to_string(), json!("trace-req-1")),
        ])
    );
    // The defaults and the middleware context are untouched.
    assert_eq!(defaults.len(), 2);
    assert_eq!(read_context_vars(&ctx).len(), 1);
}
