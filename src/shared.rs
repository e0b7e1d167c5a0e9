//! Thread-safe tracker handle.

use crate::command::{Command, Reply};
use crate::tracker::{Notification, ProcessSet, ProcessTracker, Visibility};
use crate::view::ViewBinding;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle that serialises every operation on one tracker
pub struct SharedTracker<V: ViewBinding> {
    inner: Arc<Mutex<ProcessTracker<V>>>,
}

impl<V: ViewBinding> Clone for SharedTracker<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: ViewBinding> SharedTracker<V> {
    pub fn new(tracker: ProcessTracker<V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Lock the tracker for a sequence of operations.
    ///
    /// A panic in a listener poisons the mutex after the set was updated but
    /// possibly before the view caught up. The guard is recovered and the
    /// view refreshed from the set.
    pub fn lock(&self) -> MutexGuard<'_, ProcessTracker<V>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                guard.refresh_view();
                self.inner.clear_poison();
                guard
            }
        }
    }

    pub fn start(&self, name: &str, message: Option<&str>) {
        self.lock().start(name, message);
    }

    pub fn finish(&self, name: &str, force: bool) {
        self.lock().finish(name, force);
    }

    pub fn finish_all(&self) {
        self.lock().finish_all();
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.lock().is_running(name)
    }

    pub fn is_any_process_running(&self) -> bool {
        self.lock().is_any_process_running()
    }

    pub fn get_processes(&self) -> ProcessSet {
        self.lock().get_processes()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().messages()
    }

    pub fn visibility(&self) -> Visibility {
        self.lock().visibility()
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: FnMut(&Notification) + Send + 'static,
    {
        self.lock().subscribe(listener);
    }

    pub fn dispatch(&self, command: Command) -> Reply {
        self.lock().dispatch(command)
    }

    pub fn destroy(&self) {
        self.lock().destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpinnerConfig;
    use crate::view::NullView;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn test_concurrent_start_finish() {
        let shared = SharedTracker::new(ProcessTracker::new(SpinnerConfig::default(), NullView));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let name = format!("request-{}", i % 2);
                    for _ in 0..100 {
                        shared.start(&name, Some("Loading"));
                    }
                    for _ in 0..100 {
                        shared.finish(&name, false);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(!shared.is_any_process_running());
        assert_eq!(shared.visibility(), Visibility::Hidden);
    }

    #[test]
    fn test_listener_sees_every_event() {
        let shared = SharedTracker::new(ProcessTracker::new(SpinnerConfig::default(), NullView));
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        shared.subscribe(move |_| *counter.lock().unwrap() += 1);

        let worker = shared.clone();
        thread::spawn(move || {
            worker.start("a", None);
            worker.start("a", None);
        })
        .join()
        .unwrap();
        shared.finish("a", true);

        // 2 started + 2 finished + 1 finishedAll
        assert_eq!(*seen.lock().unwrap(), 5);
    }

    #[test]
    fn test_listener_panic_recovers_visibility() {
        let shared = SharedTracker::new(ProcessTracker::new(SpinnerConfig::default(), NullView));
        let armed = Arc::new(AtomicBool::new(true));
        let trap = armed.clone();
        shared.subscribe(move |_| {
            if trap.swap(false, Ordering::SeqCst) {
                panic!("listener failure");
            }
        });

        let worker = shared.clone();
        let result = thread::spawn(move || worker.start("a", None)).join();
        assert!(result.is_err());

        assert!(shared.is_running("a"));
        assert_eq!(shared.visibility(), Visibility::Showed);
        shared.finish("a", false);
        assert_eq!(shared.visibility(), Visibility::Hidden);
    }
}
