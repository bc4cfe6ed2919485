//! Frontend-side state: page routing and the logged-in session.

pub mod router;
pub mod session;

pub use router::{Navigator, Page};
pub use session::{SessionStore, SessionUser};
