use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to record a swipe
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "swiped_user_id", rename = "swipedUserId")]
    pub swiped_user_id: String,
    #[validate(length(min = 1))]
    pub direction: String,
}
