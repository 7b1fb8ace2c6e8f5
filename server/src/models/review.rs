use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;
use super::validation::validate_not_blank;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReviewWithAuthor {
    #[sqlx(flatten)]
    pub review: Review,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    pub rating: i64,
    #[validate(custom(function = "validate_not_blank"))]
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub event: Uuid,
    pub rating: i64,
    pub comment: String,
}

impl ReviewRequest {
    /// The rating in its stored width. Only meaningful once validated.
    pub fn stored_rating(&self) -> i16 {
        self.rating.clamp(1, 5) as i16
    }
}

impl CreateReviewRequest {
    pub fn into_parts(self) -> (Uuid, ReviewRequest) {
        (
            self.event,
            ReviewRequest {
                rating: self.rating,
                comment: self.comment,
            },
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl ReviewPatch {
    pub fn apply_to(self, review: &Review) -> ReviewRequest {
        ReviewRequest {
            rating: self.rating.unwrap_or(i64::from(review.rating)),
            comment: self.comment.unwrap_or_else(|| review.comment.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub id: Uuid,
    pub event: Uuid,
    pub user: UserSummary,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewView {
    pub fn new(review: Review, user: UserSummary) -> Self {
        Self {
            id: review.id,
            event: review.event_id,
            user,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

impl From<ReviewWithAuthor> for ReviewView {
    fn from(row: ReviewWithAuthor) -> Self {
        let user = UserSummary {
            id: row.review.user_id,
            username: row.username,
        };
        Self::new(row.review, user)
    }
}
