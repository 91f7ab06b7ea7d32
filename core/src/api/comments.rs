//! Film comments.

use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::types::{Comment, CommentInput};

pub fn list_comments(movie_id: i64) -> Endpoint<Vec<Comment>> {
    Endpoint::json(HttpRequest::get("/api/comments").query("movieId", movie_id))
}

pub fn add_comment(input: &CommentInput) -> Result<Endpoint<Comment>, ApiError> {
    Ok(Endpoint::json(HttpRequest::post("/api/comments").json(input)?))
}
