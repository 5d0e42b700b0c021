//! Complaint records and the submission flow that routes them.

mod complaint;
mod registry;

pub use complaint::{Caller, Complaint, ComplaintId, ComplaintStatus, Role, UserId};
pub use registry::{ComplaintError, ComplaintRegistry, RoutingPolicy};
