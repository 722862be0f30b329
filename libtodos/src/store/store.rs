//! Action dispatch and state ownership
//!
//! [`Store`] owns the single [`AppState`] value and is the only place it
//! changes. Queued actions are applied one at a time by a background
//! dispatch task: reduce, commit, notify subscribers, then spawn whatever
//! effect the reducer requested. Effects run on their own tasks and feed
//! their results back as ordinary actions, so a slow storage backend can
//! stall its own chain but never dispatch itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::storage::TaskStore;

use super::actions::Action;
use super::effect::Effect;
use super::reducer::reduce;
use super::state::AppState;

/// Callback invoked after every commit with the previous and next state.
pub type ChangeCallback = Box<dyn FnMut(&AppState, &AppState) + Send>;

struct Subscriber {
    id: u64,
    callback: ChangeCallback,
}

/// A queued action, with an optional acknowledgement channel for
/// [`Store::dispatch`].
struct Envelope {
    action: Action,
    done: Option<oneshot::Sender<()>>,
}

struct StoreInner {
    state: RwLock<AppState>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_subscription_id: AtomicU64,
    queue: mpsc::UnboundedSender<Envelope>,
    storage: Arc<dyn TaskStore>,
}

/// Cloneable handle to the application store.
///
/// All clones share the same state, subscriber list, and dispatch queue.
/// The store holds its storage backend behind `Arc<dyn TaskStore>`, so any
/// backend can be injected at construction time.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store over the given storage backend and start its
    /// dispatch task.
    ///
    /// Must be called from within a Tokio runtime. The dispatch task stops
    /// on its own once every `Store` handle has been dropped.
    pub fn new(storage: Arc<dyn TaskStore>) -> Self {
        Self::with_state(storage, AppState::new())
    }

    /// Create a store starting from a specific state, e.g. with the theme
    /// taken from configuration.
    pub fn with_state(storage: Arc<dyn TaskStore>, state: AppState) -> Self {
        let (queue, receiver) = mpsc::unbounded_channel();
        let inner = Arc::new(StoreInner {
            state: RwLock::new(state),
            subscribers: Mutex::new(Vec::new()),
            next_subscription_id: AtomicU64::new(0),
            queue,
            storage,
        });

        // The loop holds only a weak reference; the queue sender living
        // inside StoreInner keeps the channel open exactly as long as a
        // handle to the store exists.
        tokio::spawn(dispatch_loop(Arc::downgrade(&inner), receiver));

        Self { inner }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.inner.state.read().unwrap().clone()
    }

    /// Queue an action and wait until it has been applied.
    ///
    /// Completion means the reducer ran, the new state is committed, and
    /// subscribers were notified. Any effect the action produced may still
    /// be running; its outcome arrives as a later action.
    pub async fn dispatch(&self, action: Action) -> Result<()> {
        let (done, applied) = oneshot::channel();
        self.inner
            .queue
            .send(Envelope {
                action,
                done: Some(done),
            })
            .map_err(|_| StoreError::QueueClosed)?;
        applied.await.map_err(|_| StoreError::QueueClosed)?;
        Ok(())
    }

    /// Queue an action without waiting for it.
    ///
    /// Used by effects to feed results back into the loop. If the dispatch
    /// task has already stopped the action is dropped.
    fn enqueue(&self, action: Action) {
        let _ = self.inner.queue.send(Envelope { action, done: None });
    }

    /// Register a change callback, invoked with `(previous, next)` after
    /// every commit.
    ///
    /// Callbacks run on the dispatch task in subscription order. A callback
    /// must not subscribe, unsubscribe, or wait on `dispatch` for the same
    /// store; hand work that needs those off to a channel instead.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&AppState, &AppState) + Send + 'static,
    {
        let id = self
            .inner
            .next_subscription_id
            .fetch_add(1, Ordering::Relaxed);
        {
            let mut subscribers = self.inner.subscribers.lock().unwrap();
            subscribers.push(Subscriber {
                id,
                callback: Box::new(callback),
            });
        }

        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered change callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap().len()
    }

    /// Handle to the storage backend effects run against.
    ///
    /// Useful for reads that live outside the action cycle, such as listing
    /// projects for a picker.
    pub fn storage(&self) -> Arc<dyn TaskStore> {
        Arc::clone(&self.inner.storage)
    }
}

/// Handle for a registered change callback.
///
/// Dropping the subscription removes the callback.
#[must_use = "dropping a Subscription removes its callback"]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Subscription {
    /// Remove the callback now instead of when the handle goes out of
    /// scope.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            let mut subscribers = inner.subscribers.lock().unwrap();
            subscribers.retain(|subscriber| subscriber.id != self.id);
        }
    }
}

/// Apply queued actions one at a time.
///
/// Each envelope is a full cycle: reduce, commit, notify, acknowledge,
/// spawn effect. The loop upgrades its weak reference per envelope and
/// exits once the store is gone.
async fn dispatch_loop(store: Weak<StoreInner>, mut receiver: mpsc::UnboundedReceiver<Envelope>) {
    while let Some(envelope) = receiver.recv().await {
        let Some(inner) = store.upgrade() else { break };

        debug!(action = ?envelope.action, "applying action");

        let previous = inner.state.read().unwrap().clone();
        let (next, effect) = reduce(previous.clone(), envelope.action);
        *inner.state.write().unwrap() = next.clone();

        {
            let mut subscribers = inner.subscribers.lock().unwrap();
            for subscriber in subscribers.iter_mut() {
                (subscriber.callback)(&previous, &next);
            }
        }

        if let Some(done) = envelope.done {
            // The dispatcher may have given up waiting; that's fine
            let _ = done.send(());
        }

        if let Some(effect) = effect {
            let store = Store {
                inner: Arc::clone(&inner),
            };
            tokio::spawn(run_effect(store, effect));
        }
    }
}

/// Run a side effect and feed its outcome back as an action.
///
/// Failures never propagate out of the task: they are converted to
/// [`Action::StorageFailed`] so the error lands in `AppState.error` like
/// any other state change.
async fn run_effect(store: Store, effect: Effect) {
    match effect {
        Effect::LoadTasks => match store.inner.storage.load().await {
            Ok(tasks) => {
                debug!(count = tasks.len(), "tasks loaded");
                store.enqueue(Action::TasksLoaded(tasks));
            }
            Err(e) => {
                warn!("failed to load tasks: {}", e);
                store.enqueue(Action::StorageFailed(e.to_string()));
            }
        },

        Effect::ToggleCompletion { task_id } => {
            match store.inner.storage.toggle_completion(task_id).await {
                Ok(task) => {
                    debug!(task_id, completed = task.completed, "completion persisted");
                }
                Err(e) => {
                    warn!(task_id, "failed to toggle completion: {}", e);
                    store.enqueue(Action::StorageFailed(e.to_string()));
                }
            }
        }

        Effect::SaveTasks => {
            // Individual writes persist themselves; nothing to flush.
            debug!("save effect acknowledged");
        }
    }
}
