pub mod output;
pub mod session_cmd;

pub use session_cmd::{build_session, run_session_action, ClientOptions, SessionAction};
