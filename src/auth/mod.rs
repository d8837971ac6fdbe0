pub mod client;
pub mod events;
pub mod session;

pub use client::{ApiClient, ApiRequest};
pub use events::{LoggingEvents, RecordingEvents, SessionEvent, SessionEvents, LOGIN_PATH};
pub use session::{Session, REFRESH_TOKEN_KEY};
