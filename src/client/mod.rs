pub mod api;
pub mod events;
pub mod media;
pub mod remote;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiResponse};
pub use events::{Event, EventLog};
pub use media::MediaUri;
pub use remote::RemoteExchanger;
pub use session::{PlayerSession, RedirectResult};
pub use storage::LocalStorage;
