use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

#[derive(Default)]
struct CancelState {
    cancelled: Cell<bool>,
    listeners: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Cooperative cancellation flag shared between a run and whoever may abort it.
///
/// Clones observe the same flag. Listeners registered with [`CancelToken::on_cancel`] run
/// once, at the moment of cancellation (or immediately if already cancelled).
#[derive(Clone, Default)]
pub struct CancelToken {
    state: Rc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.get()
    }

    /// Returns false if the token was already cancelled.
    pub fn cancel(&self) -> bool {
        if self.state.cancelled.replace(true) {
            return false;
        }
        let listeners = std::mem::take(&mut *self.state.listeners.borrow_mut());
        for listener in listeners {
            listener();
        }
        true
    }

    pub fn on_cancel(&self, listener: impl FnOnce() + 'static) {
        if self.is_cancelled() {
            listener();
            return;
        }
        self.state.listeners.borrow_mut().push(Box::new(listener));
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
