use crate::cell::*;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type Xscope = Rc<Scope>;

/// Variable bindings of one function invocation, linked to the scope that
/// was active when the function was defined.
#[derive(Default)]
pub struct Scope {
    bindings: RefCell<HashMap<Xstr, Cell>>,
    parent: Option<Xscope>,
}

impl Scope {
    pub fn root() -> Xscope {
        Rc::new(Scope::default())
    }

    pub fn child(parent: &Xscope) -> Xscope {
        Rc::new(Scope {
            bindings: Default::default(),
            parent: Some(parent.clone()),
        })
    }

    pub fn lookup(&self, name: &str) -> Option<Cell> {
        if let Some(val) = self.bindings.borrow().get(name) {
            return Some(val.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    // always the innermost scope, no write-through
    pub fn bind(&self, name: Xstr, val: Cell) {
        self.bindings.borrow_mut().insert(name, val);
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Every visible binding, inner scopes shadow outer ones.
    pub fn flatten(&self) -> Xstrmap {
        let mut m = self.parent.as_ref().map(|p| p.flatten()).unwrap_or_default();
        for (k, v) in self.bindings.borrow().iter() {
            m.insert_mut(k.clone(), v.clone());
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_chain() {
        let root = Scope::root();
        root.bind(Xstr::from("a"), ONE);
        let inner = Scope::child(&root);
        assert_eq!(Some(ONE), inner.lookup("a"));
        inner.bind(Xstr::from("a"), ZERO);
        assert_eq!(Some(ZERO), inner.lookup("a"));
        assert_eq!(Some(ONE), root.lookup("a"));
        inner.bind(Xstr::from("b"), TRUE);
        assert_eq!(None, root.lookup("b"));
        assert!(root.is_root());
        assert!(!inner.is_root());
        let m = inner.flatten();
        assert_eq!(Some(&ZERO), m.get("a"));
        assert_eq!(2, m.size());
    }
}
