//! Database Models
//!
//! Row structs plus their Create/Update payloads, one file per table.
//! Record ids are plain `i64` on the Rust side (see [`serde_helpers`]).

pub mod serde_helpers;
pub mod skill;
pub mod technician;
pub mod ticket;
pub mod user;

pub use skill::{Skill, SkillCreate, SkillUpdate};
pub use technician::{
    AvailabilityStatus, SkillLevel, Technician, TechnicianCreate, TechnicianSkill,
    TechnicianSummary, TechnicianUpdate,
};
pub use ticket::{
    Impact, Priority, Task, TaskStatus, Ticket, TicketCreate, TicketDetail, TicketStatus,
    TicketUpdate, Urgency, WorkLog,
};
pub use user::{User, UserCreate, UserRole, UserSummary, UserUpdate};
