//! Conversation with the node.
//!
//! [`messages`] defines the wire vocabulary and [`session`] drives it: the
//! startup requests, template refreshes, and the hand-off of new templates
//! to the miner.

pub mod messages;
pub mod session;

pub use messages::KaspadMessage;
pub use session::{Session, SessionOptions};
