// Library surface for the binary, integration tests and reuse.
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod feedback;
pub mod practice;
pub mod profile;
pub mod runtime;
pub mod selection;
pub mod similarity;
pub mod speech;
pub mod store;
pub mod trainer;
pub mod util;
pub mod word;

pub use catalog::WordCatalog;
pub use practice::{PracticeSession, SessionError, SessionState};
pub use profile::{AttemptRecord, LearnerProfile, SessionId, WeakWord};
pub use selection::SessionBuilder;
pub use trainer::Trainer;
pub use word::Word;
