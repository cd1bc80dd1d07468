//! The variable scope chain (§3, "Scope chain"; §9 Design Notes).
//!
//! A stack of frames, each a name→value map. `push` creates a child frame;
//! lookups walk from the top of the stack down to the global frame at the
//! bottom. Frame release is expressed as an RAII guard rather than a manual
//! `pop()` call so that an evaluator that returns early via `?` still
//! releases its frame — "guaranteed release on all exit paths, including
//! error unwinding" per Design Notes §9.

use crate::internal::value::Value;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ScopeChain {
    frames: Vec<HashMap<String, Value>>,
}

impl ScopeChain {
    /// A fresh chain with one (global) frame.
    pub fn new() -> Self {
        ScopeChain {
            frames: vec![HashMap::new()],
        }
    }

    /// Pushes a child frame and returns a guard that pops it when dropped.
    pub fn push(&mut self) -> ScopeGuard<'_> {
        self.frames.push(HashMap::new());
        ScopeGuard { chain: self }
    }

    fn pop(&mut self) {
        // The global frame is never popped.
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Binds `name` in the current (innermost) frame, shadowing any outer
    /// binding of the same name — §4.3: "`v := e` ... binds `v` in the
    /// current frame."
    pub fn define(&mut self, name: &str, value: Value) {
        let top = self.frames.last_mut().expect("scope chain is never empty");
        top.insert(name.to_string(), value);
    }

    /// Walks from the innermost frame outward.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// RAII guard returned by [`ScopeChain::push`]; pops the frame it was
/// constructed for when dropped, regardless of how the enclosing scope is
/// exited.
pub struct ScopeGuard<'a> {
    chain: &'a mut ScopeChain,
}

impl<'a> std::ops::Deref for ScopeGuard<'a> {
    type Target = ScopeChain;
    fn deref(&self) -> &ScopeChain {
        self.chain
    }
}

impl<'a> std::ops::DerefMut for ScopeGuard<'a> {
    fn deref_mut(&mut self) -> &mut ScopeChain {
        self.chain
    }
}

impl<'a> Drop for ScopeGuard<'a> {
    fn drop(&mut self) {
        self.chain.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_up_the_chain() {
        let mut chain = ScopeChain::new();
        chain.define("x", Value::Int(1));
        {
            let mut inner = chain.push();
            assert_eq!(inner.get("x"), Some(&Value::Int(1)));
            inner.define("y", Value::Int(2));
            assert_eq!(inner.get("y"), Some(&Value::Int(2)));
        }
        assert_eq!(chain.get("y"), None);
        assert_eq!(chain.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn define_shadows_in_inner_frame_without_touching_outer() {
        let mut chain = ScopeChain::new();
        chain.define("x", Value::Int(1));
        {
            let mut inner = chain.push();
            inner.define("x", Value::Int(99));
            assert_eq!(inner.get("x"), Some(&Value::Int(99)));
        }
        assert_eq!(chain.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn guard_pops_even_when_caller_returns_early() {
        let mut chain = ScopeChain::new();
        fn fallible(chain: &mut ScopeChain) -> Result<(), ()> {
            let mut inner = chain.push();
            inner.define("z", Value::Int(1));
            Err(())
        }
        let depth_before = chain.depth();
        let _ = fallible(&mut chain);
        assert_eq!(chain.depth(), depth_before);
    }

    #[test]
    fn global_frame_is_never_popped() {
        let mut chain = ScopeChain::new();
        chain.pop();
        chain.pop();
        assert_eq!(chain.depth(), 1);
    }
}
