//! Model module - Session state and data types
//!
//! - `types`: values exchanged between controller, backends and host
//! - `session`: the live session (surface arena, results, device picker)

mod session;
mod types;

pub use session::{Session, SurfaceKind, SurfaceRecord, cycle_index};
pub use types::{Command, Device, Direction, NowPlaying, PlaybackAction, ResultRow, SearchMode};
