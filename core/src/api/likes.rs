//! Per-user like relations.

use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::types::LikeKey;

pub fn add_like(key: LikeKey) -> Result<Endpoint<()>, ApiError> {
    Ok(Endpoint::json(HttpRequest::post("/api/likes/addLike").json(&key)?))
}

pub fn delete_like(key: LikeKey) -> Endpoint<()> {
    Endpoint::json(with_key(HttpRequest::delete("/api/likes/deleteLike"), key))
}

/// Whether the user has liked the film.
pub fn get_like(key: LikeKey) -> Endpoint<bool> {
    Endpoint::json(with_key(HttpRequest::get("/api/likes/getLike"), key))
}

fn with_key(request: HttpRequest, key: LikeKey) -> HttpRequest {
    request.query("uid", key.uid).query("mid", key.mid)
}
