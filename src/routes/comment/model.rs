use serde::Deserialize;

use crate::error::AppError;

pub const MAX_SLUG_LEN: usize = 200;
pub const MAX_AUTHOR_LEN: usize = 80;
pub const MAX_BODY_LEN: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct CommentQuery {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub slug: String,
    pub author: String,
    pub body: String,
}

fn check_field(name: &str, value: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", name)));
    }
    if value.chars().count() > max_len {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            name, max_len
        )));
    }
    Ok(())
}

impl CreateCommentRequest {
    /// 校验并去掉首尾空白
    pub fn validated(self) -> Result<Self, AppError> {
        let slug = self.slug.trim().to_string();
        let author = self.author.trim().to_string();
        let body = self.body.trim().to_string();

        check_field("slug", &slug, MAX_SLUG_LEN)?;
        check_field("author", &author, MAX_AUTHOR_LEN)?;
        check_field("body", &body, MAX_BODY_LEN)?;

        Ok(Self { slug, author, body })
    }
}
