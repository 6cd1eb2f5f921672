mod error;
mod event;
mod record;
mod reducer;

pub use error::PassError;
pub use event::{align_events, EventKind, PassEvent};
pub use record::PassRecord;
pub use reducer::reduce_events;
