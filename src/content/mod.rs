//! Content module - post models, rich text, reading time and pagination

pub mod pagination;
mod post;
pub mod reading_time;
pub mod rich_text;

pub use pagination::{load_more, PaginationState};
pub use post::{Banner, ContentBlock, PostDetail, PostSummary};
pub use reading_time::estimate_minutes;
pub use rich_text::RichTextNode;
