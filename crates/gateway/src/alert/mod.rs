mod buffer;
mod manager;
mod model;

pub use buffer::{AlertBuffer, SnapshotError};
pub use manager::{AlertManager, ProcessError};
pub use model::{
    Alert, AlertStatus, DELAYED_RESOLVE_LABEL, DELAY_RESOLVE_LABEL, DO_NOT_SEND_RESOLVED_LABEL,
    UID_LABEL,
};
