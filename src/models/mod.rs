pub mod event;
pub mod task;
pub mod user;

pub use event::{Event, EventInput, EventUpdate, TimelineQuery};
pub use task::{Task, TaskInput, TaskUpdate};
pub use user::{User, UserUpdate};
