pub mod inmemory;
pub mod service;
pub mod session;

pub use inmemory::InMemorySessionService;
pub use launchpad_core::{Event, EventActions, KEY_PREFIX_APP, KEY_PREFIX_TEMP, KEY_PREFIX_USER};
pub use service::{CreateRequest, DeleteRequest, GetRequest, ListRequest, SessionService};
pub use session::Session;
