// Service exports
pub mod feedback;
pub mod ledger;
pub mod profiles;
pub mod reasoning;
pub mod speech;
pub mod swipes;

pub use feedback::FeedbackLedger;
pub use ledger::LedgerStore;
pub use profiles::{ProfileLoadError, ProfileRepository, ProfileSnapshot};
pub use reasoning::{AzureReasoningClient, CollaboratorError, ReasoningClient, ReasoningRequest};
pub use speech::{AzureSpeechClient, SpeechClient};
pub use swipes::{SwipeLedger, SwipeStats};
