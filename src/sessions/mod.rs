//! Session management: ordered in-memory storage of per-(app, user, session)
//! conversation histories.

pub mod error;
pub mod in_memory;
pub mod key;
pub mod record;
pub mod store;
pub mod traits;

pub use error::{Result, SessionError};
pub use in_memory::InMemorySessionService;
pub use key::{EncodedKey, KeyDecodeError, SessionId};
pub use record::SessionRecord;
pub use store::{OrderedStore, ScanIter};
pub use traits::{CreateRequest, Event, GetRequest, ListRequest, Session, SessionService};

use crate::config::SessionsConfig;

/// Create a default in-memory session service.
pub fn create_session_service(config: &SessionsConfig) -> Box<dyn SessionService> {
    Box::new(InMemorySessionService::with_config(config))
}
