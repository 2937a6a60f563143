//! Timeline interaction engine: drag sessions, lane layout, deadline flags
//! and the commit boundary. Nothing in here touches the screen.

pub mod commit;
pub mod context;
pub mod deadline;
pub mod drag;
pub mod layout;
pub mod projection;

pub use commit::{Commit, CommitBoundary};
pub use context::{ContextAction, HitTarget};
pub use drag::{DragPhase, InteractionController};
pub use projection::{LaneMetrics, StreamBar};
