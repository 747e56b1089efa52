//! Domain types shared across the workspace.

pub mod email;
pub mod id;
pub mod locale;
pub mod price;
pub mod rating;

pub use email::{Email, EmailError};
pub use id::*;
pub use locale::{Locale, LocaleError};
pub use price::Price;
pub use rating::{Rating, RatingError, RatingStats};
