//! Screening (session) management.

use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::types::{Screening, ScreeningInput};

pub fn list_screenings(movie_id: i64) -> Endpoint<Vec<Screening>> {
    Endpoint::json(HttpRequest::get("/api/screenings").query("movieId", movie_id))
}

pub fn add_screening(input: &ScreeningInput) -> Result<Endpoint<Screening>, ApiError> {
    Ok(Endpoint::json(HttpRequest::post("/api/screenings").json(input)?))
}

pub fn delete_screening(id: i64) -> Endpoint<()> {
    Endpoint::json(HttpRequest::delete(format!("/api/screenings/{id}")))
}
