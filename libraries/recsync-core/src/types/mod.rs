mod filter;
mod ids;
mod period;
mod record;
mod request;
mod stream;
mod task;

pub use filter::{RecordColumn, RecordCondition, RecordFilter, RecordFlag};
pub use ids::{RecordId, ServerId, StreamId, TaskId};
pub use period::Period;
pub use record::{NewRecord, Record};
pub use request::{SyncRequest, SyncWindowSpec};
pub use stream::{Stream, StreamType};
pub use task::{TaskOutcome, TaskRegistration};
