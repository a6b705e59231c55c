pub mod events;

pub use events::{EventCallback, EventEmitter, StatusEvent, StatusLevel};
