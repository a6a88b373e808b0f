mod common;
mod session;
mod transport;

pub use common::{AsyncTimer, Clock};
pub use session::{IdentityProvider, SessionNotification, SessionNotifier};
pub use transport::{Transport, TransportError, TransportEvent};
