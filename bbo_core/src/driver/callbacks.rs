//! Callback registry invoked after every appended evaluation, with the raw
//! (non-aggregated) history — mirrors the callback list threaded through
//! `optimizer.py`'s `optimize()` loop.

use crate::history::History;

pub type Callback = Box<dyn Fn(&History) + Send>;

#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: Vec<Callback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callback: Callback) {
        self.callbacks.push(callback);
    }

    pub fn fire(&self, history: &History) {
        for callback in &self.callbacks {
            callback(history);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn fire_invokes_every_registered_callback() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = CallbackRegistry::new();
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            registry.register(Box::new(move |_history| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        registry.fire(&History::new());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
