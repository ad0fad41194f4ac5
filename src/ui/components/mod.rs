mod alert;
mod input;
mod search_input;

pub use alert::Alert;
pub use search_input::{SearchEvent, SearchInput};

/// How a component dealt with a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, with an event for the parent
  Event(T),
  /// Not consumed; parent should try its own bindings
  NotHandled,
}
