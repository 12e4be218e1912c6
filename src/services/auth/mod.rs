pub mod clock;
pub mod session;

pub use clock::{Clock, SystemClock};
pub use session::{SessionError, SessionManager};
