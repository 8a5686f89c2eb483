// Core algorithm exports
pub mod advice;
pub mod engagement;
pub mod matchmaker;
pub mod prompting;
pub mod scoring;

pub use advice::{detect_red_flags, fallback_prose, recommend_date, AdviceAssembler};
pub use engagement::{EngagementAnalyzer, EngagementSignal};
pub use matchmaker::{fake_phone_number, Matchmaker};
pub use prompting::{strip_code_fences, Analysis};
pub use scoring::{shared_interests, CompatibilityScorer};
