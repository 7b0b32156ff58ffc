mod handler;
mod model;

pub use handler::{create_comment, list_comments};
pub use model::{CommentQuery, CreateCommentRequest};
