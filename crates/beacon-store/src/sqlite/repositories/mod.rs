//! Stateless repositories over a borrowed [`rusqlite::Connection`].

pub mod preference;
pub mod queue;

pub use preference::PreferenceRepo;
pub use queue::QueueRepo;
