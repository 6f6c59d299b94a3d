//! Payload types sent to the tracking service.
//!
//! The delivery layer treats these opaquely; they only need to serialize.

pub mod approval;
pub mod evidence;
pub mod user_data;

pub use approval::{ApprovalPayload, Review, APPROVED_STATE};
pub use evidence::CommitEvidencePayload;
pub use user_data::load_user_data;
