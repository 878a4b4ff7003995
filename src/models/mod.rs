pub mod content;
pub mod job;
pub mod loaders;
pub mod report;
pub mod style_profile;
pub mod topic;

pub use content::{Criterion, Draft, GeneratedImage, QualityScore, ResearchBundle, ResearchFact, Verdict};
pub use job::{JobState, PublishJob};
pub use loaders::{load_profile_corpus, load_style_profiles};
pub use report::{JobSummary, RunMode, RunReport, UsageRecord};
pub use style_profile::{blend_traits, builtin_profiles, StyleProfile, StyleTraits};
pub use topic::{topic_id, HistoryEntry, PublishStatus, Topic};
