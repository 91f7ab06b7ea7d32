//! Report export; the only binding answered with raw bytes.

use crate::endpoint::{Download, Endpoint};
use crate::http::HttpRequest;

pub fn export_data(year: i32) -> Endpoint<Download> {
    Endpoint::binary(HttpRequest::get("/api/export/data").query("year", year))
}
