pub mod artifacts;
pub mod chat;
pub mod session_log;
pub mod styles;
pub mod view_state;

pub use artifacts::{DataUri, GeneratedArtifact, History, Metadata, Trait, HISTORY_LIMIT};
pub use session_log::{read_session_log, SessionEvent, SessionLog, SessionRecord};
pub use styles::StyleOption;
pub use view_state::ViewState;
