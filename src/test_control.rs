//! Lobby reset hook for end-to-end tests.
//!
//! Sessions live entirely in cookies, so the only state that can leak from
//! one test case into the next is what lobby and game collaborators keep in
//! memory. [`TestControl`] is the capability to wipe it. It only exists in
//! builds with the `test-control` feature (or under `cargo test`).

#[cfg(any(test, feature = "test-control"))]
use std::sync::Arc;

/// Process-wide mutable state that can be wiped between test cases
pub trait Resettable: Send + Sync {
    fn reset(&self);
}

#[cfg(any(test, feature = "test-control"))]
#[derive(Clone, Default)]
pub struct TestControl {
    targets: Vec<Arc<dyn Resettable>>,
}

#[cfg(any(test, feature = "test-control"))]
impl TestControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, target: Arc<dyn Resettable>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn reset_all(&self) {
        for target in &self.targets {
            target.reset();
        }
        log::debug!("Test state reset ({} collaborators)", self.targets.len());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counter(AtomicUsize);
    impl Resettable for Counter {
        fn reset(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn resets_every_registered_target() {
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        let control = TestControl::new().register(a.clone()).register(b.clone());

        control.reset_all();
        control.clone().reset_all();

        assert_eq!(a.0.load(Ordering::SeqCst), 2);
        assert_eq!(b.0.load(Ordering::SeqCst), 2);
    }
}
