use std::{cell::RefCell, rc::Rc};

use crate::api::Author;

/// Source of the currently authenticated identity, queried synchronously when
/// building an optimistic comment
pub trait Session {
    fn current_author(&self) -> Option<Author>;
}

impl Session for Option<Author> {
    fn current_author(&self) -> Option<Author> {
        self.clone()
    }
}

/// Shared login state, updated by whatever handles login and logout
impl Session for Rc<RefCell<Option<Author>>> {
    fn current_author(&self) -> Option<Author> {
        self.borrow().clone()
    }
}
