//! Declarative state-to-view binding
//!
//! A [`Binding`] connects one slice of [`AppState`] to one view update
//! function. The selector derives a value from the state; the apply
//! function runs when that value actually changes. Views written this way
//! never poll and never re-render for unrelated commits.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use libtodos::storage::MemoryStore;
//! use libtodos::store::{Binding, Store};
//!
//! # async fn example() {
//! let store = Store::new(Arc::new(MemoryStore::new()));
//!
//! // Repaint the title bar whenever the theme changes.
//! let binding = Binding::new(
//!     &store,
//!     |state| state.theme.clone(),
//!     |theme| println!("theme is now {theme}"),
//! );
//!
//! // Later, disconnect explicitly (or just drop the binding).
//! binding.unbind();
//! # }
//! ```

use super::state::AppState;
use super::store::{Store, Subscription};

/// A live connection between a selected slice of state and a view update
/// function.
///
/// The apply function runs once at construction with the current value, so
/// views never start blank, and again after every commit whose selected
/// value differs (`PartialEq`) from the one last applied. Commits that
/// leave the selection untouched are skipped entirely.
#[must_use = "dropping a Binding disconnects it"]
pub struct Binding {
    subscription: Subscription,
}

impl Binding {
    /// Bind the output of `selector` to `apply`.
    ///
    /// After the initial call, `apply` runs on the dispatch task; the same
    /// constraints as [`Store::subscribe`] callbacks apply to it.
    pub fn new<T, S, A>(store: &Store, mut selector: S, mut apply: A) -> Self
    where
        T: PartialEq + Send + 'static,
        S: FnMut(&AppState) -> T + Send + 'static,
        A: FnMut(&T) + Send + 'static,
    {
        let mut last = selector(&store.state());
        apply(&last);

        let subscription = store.subscribe(move |_, next| {
            let value = selector(next);
            if value != last {
                apply(&value);
                last = value;
            }
        });

        Binding { subscription }
    }

    /// Disconnect the binding now instead of when the handle goes out of
    /// scope.
    pub fn unbind(self) {
        self.subscription.unsubscribe();
    }
}
