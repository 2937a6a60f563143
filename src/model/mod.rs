pub mod normalize;
pub mod project;
pub mod stream;
pub mod timeline;
pub mod todo;

pub use project::Project;
pub use stream::{Deadline, Stream, DEFAULT_STREAM_DURATION, MIN_DURATION, PALETTE_SIZE};
pub use timeline::{TimeMapper, TimelineWindow, WindowSpan};
pub use todo::{TodoFilter, TodoList};
