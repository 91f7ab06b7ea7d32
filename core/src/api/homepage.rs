//! Homepage listings and the like counter.

use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::types::{Film, LikeToggle};

pub fn list_all_films() -> Endpoint<Vec<Film>> {
    Endpoint::json(HttpRequest::get("/api/homepage/filmList"))
}

pub fn list_hot_films() -> Endpoint<Vec<Film>> {
    Endpoint::json(HttpRequest::get("/api/homepage/hotList"))
}

/// Adjust a film's like counter. Sent as PATCH with an explicit JSON
/// content type.
pub fn update_likes(film_id: i64, is_star_clicked: bool) -> Result<Endpoint<()>, ApiError> {
    let toggle = LikeToggle {
        id: film_id,
        is_star_clicked,
    };
    Ok(Endpoint::json(
        HttpRequest::patch("/api/homepage/updateLikes").json(&toggle)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{assert_shape, body};
    use crate::http::HttpMethod;

    #[test]
    fn listings_are_plain_gets() {
        assert_shape(&list_all_films(), HttpMethod::Get, "/api/homepage/filmList");
        assert_shape(&list_hot_films(), HttpMethod::Get, "/api/homepage/hotList");
        assert!(list_all_films().request().body.is_none());
    }

    #[test]
    fn update_likes_sends_toggle_body() {
        let endpoint = update_likes(12, true).unwrap();
        assert_shape(&endpoint, HttpMethod::Patch, "/api/homepage/updateLikes");
        assert_eq!(
            endpoint.request().header_value("content-type"),
            Some("application/json")
        );
        assert_eq!(body(&endpoint), serde_json::json!({ "id": 12, "isStarClicked": true }));
    }
}
