//! Long-running provisioning daemon: interval scheduler + run processor +
//! control socket.

mod error;
pub mod log_rotation;
pub mod logging;
pub mod paths;
pub mod protocol;
mod runtime;

pub use error::DaemonError;
pub use logging::{init_files, init_stderr, LogFormat};
pub use protocol::{
    request_run, request_status, request_stop, send_request, DaemonRequest, DaemonResponse,
};
pub use runtime::{run, start_blocking, ConfiguredJob, Job, RunHistory, RunSummary};
