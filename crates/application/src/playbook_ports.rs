mod collaborators;
mod repository;
mod runs;

pub use collaborators::{ActivityLogEntry, ActivityLogWriter, NewTask, TaskQueue};
pub use repository::PlaybookRepository;
pub use runs::{
    PlaybookRun, PlaybookRunDraft, PlaybookRunListQuery, PlaybookRunMetrics, PlaybookRunStatus,
};
