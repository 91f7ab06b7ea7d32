//! Typed bindings, one function per remote operation.
//!
//! # Design
//! Each binding maps its arguments onto a single `Endpoint`: identifiers go
//! into the path, filters and pagination into the query string, and
//! create/update payloads into the JSON body. No binding touches the network
//! or applies business rules; `ApiClient::call` dispatches the result.
//!
//! Bindings with a JSON body return `Result` because serialization can fail.

pub mod comments;
pub mod export;
pub mod homepage;
pub mod likes;
pub mod movies;
pub mod orders;
pub mod screenings;
pub mod user;

use crate::http::HttpRequest;
use crate::types::PageQuery;

fn paged(request: HttpRequest, page: PageQuery) -> HttpRequest {
    request
        .query("page", page.page)
        .query("pageSize", page.page_size)
}
