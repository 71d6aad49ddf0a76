pub mod candidate;
pub mod change_event;
