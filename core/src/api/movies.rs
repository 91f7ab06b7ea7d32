//! Film administration.

use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::multipart::Multipart;
use crate::types::{Film, FilmInput};

pub fn add_movie(input: &FilmInput) -> Result<Endpoint<Film>, ApiError> {
    Ok(Endpoint::json(HttpRequest::post("/api/movies").json(input)?))
}

pub fn update_movie(id: i64, input: &FilmInput) -> Result<Endpoint<Film>, ApiError> {
    Ok(Endpoint::json(
        HttpRequest::put(format!("/api/movies/{id}")).json(input)?,
    ))
}

pub fn delete_movie(id: i64) -> Endpoint<()> {
    Endpoint::json(HttpRequest::delete(format!("/api/movies/{id}")))
}

/// Upload a poster image; the server answers with the stored image URL.
pub fn upload_poster(
    filename: &str,
    content_type: &str,
    data: Vec<u8>,
) -> Result<Endpoint<String>, ApiError> {
    let form = Multipart::new().file("file", filename, content_type, data);
    Ok(Endpoint::json(
        HttpRequest::post("/api/upload").multipart(&form)?,
    ))
}
