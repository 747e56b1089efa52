//! Product reviews.

use chrono::{DateTime, Utc};
use thiserror::Error;

use aunclic_core::{CustomerId, Email, ProductId, Rating, RatingError, ReviewId};

use crate::db::RepositoryError;

const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    InvalidRating(#[from] RatingError),
    #[error("comment cannot be empty")]
    EmptyComment,
    #[error("comment must be at most {max} characters", max = MAX_COMMENT_CHARS)]
    CommentTooLong,
    #[error("customer already reviewed this product")]
    AlreadyReviewed,
    #[error("product not found")]
    ProductNotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ReviewError {
    /// Toast message key shown to the shopper.
    #[must_use]
    pub const fn message_key(&self) -> &'static str {
        match self {
            Self::InvalidRating(_) => "reviews.ratingRequired",
            Self::EmptyComment | Self::CommentTooLong => "reviews.commentRequired",
            Self::AlreadyReviewed => "reviews.alreadyReviewed",
            Self::ProductNotFound | Self::Repository(_) => "reviews.submitError",
        }
    }
}

/// A validated review submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub rating: Rating,
    pub comment: String,
}

impl NewReview {
    /// # Errors
    ///
    /// Rejects ratings outside `1..=5` and blank or overlong comments.
    pub fn parse(stars: i64, comment: &str) -> Result<Self, ReviewError> {
        let rating = Rating::new(stars)?;
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::EmptyComment);
        }
        if comment.chars().count() > MAX_COMMENT_CHARS {
            return Err(ReviewError::CommentTooLong);
        }
        Ok(Self {
            rating,
            comment: comment.to_owned(),
        })
    }
}

/// A review with the author's name for display.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewWithAuthor {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub stars: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub author_name: Option<String>,
    pub author_email: Email,
}

impl ReviewWithAuthor {
    #[must_use]
    pub fn author(&self) -> &str {
        self.author_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.author_email.local_part())
    }

    /// Stars clamped to the valid range for drawing.
    #[must_use]
    pub fn filled_stars(&self) -> u8 {
        u8::try_from(self.stars.clamp(0, i16::from(Rating::MAX))).unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trims_comment() {
        let review = NewReview::parse(5, "  ¡Muy rico!  ").ok();
        assert_eq!(review.map(|r| r.comment), Some("¡Muy rico!".to_owned()));
    }

    #[test]
    fn rejects_missing_rating() {
        let err = NewReview::parse(0, "bueno").unwrap_err();
        assert!(matches!(err, ReviewError::InvalidRating(_)));
        assert_eq!(err.message_key(), "reviews.ratingRequired");
    }

    #[test]
    fn rejects_blank_comment() {
        assert!(matches!(NewReview::parse(4, " \n\t "), Err(ReviewError::EmptyComment)));
    }

    #[test]
    fn rejects_overlong_comment() {
        let long = "a".repeat(MAX_COMMENT_CHARS + 1);
        assert!(matches!(NewReview::parse(3, &long), Err(ReviewError::CommentTooLong)));
    }
}
