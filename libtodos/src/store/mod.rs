//! Unidirectional state management
//!
//! The engine behind the application:
//! - Actions: everything that can happen, as plain data
//! - State: what is true right now
//! - Reducer: pure function `(State, Action) -> (State, Option<Effect>)`
//! - Store: owns the state and applies actions one at a time
//! - Binding: connects selected slices of state to view updates
//!
//! State only ever changes by dispatching an action. Effects describe the
//! I/O an action calls for; the store runs them off the dispatch task and
//! feeds their outcomes back in as further actions, so even storage
//! failures travel the same one-way loop.

pub mod actions;
pub mod binding;
pub mod effect;
pub mod reducer;
pub mod state;
#[allow(clippy::module_inception)]
pub mod store;

// Re-export the types callers work with
pub use actions::Action;
pub use binding::Binding;
pub use effect::Effect;
pub use reducer::reduce;
pub use state::AppState;
pub use store::{ChangeCallback, Store, Subscription};
