//! Domain entities owned by the stores.
//!
//! Every entity gets its identity from the store that creates it and never
//! changes it afterwards. Mutations go through partial patches applied by the
//! owning store.

pub mod alert;
pub mod event;
pub mod job;
pub mod machine;
pub mod message;
pub mod project;

pub use alert::{AlertDraft, AlertSeverity, AlertType, SystemAlert};
pub use event::{ActivityEvent, EventDraft, EventKind, WORKSHOP_TAG};
pub use job::{Job, JobDraft, JobPatch, JobStatus, WorkflowStage};
pub use machine::{Machine, MachineDraft, MachinePatch, MachineStatus, MachineType};
pub use message::{MessageDraft, Recipient, SystemMessage};
pub use project::{Project, ProjectDraft, ProjectStatus};
