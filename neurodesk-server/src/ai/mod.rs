//! AI service integration
//!
//! HTTP client for the external assignment/evaluation service plus the
//! tolerant response decoder. The service is a black-box collaborator:
//! assignment is best-effort, so everything in here is built to degrade
//! into an audit-visible outcome instead of failing the request path.

mod client;
pub mod response;

pub use client::{AiServiceClient, AiServiceError, AssignmentTicket};
pub use response::{AiAssignment, decode_assignment};
