//! Ticket orders.

use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::types::{Order, OrderInput, OrderStatus, Page, PageQuery};

pub fn list_orders(page: PageQuery, status: Option<OrderStatus>) -> Endpoint<Page<Order>> {
    let request = super::paged(HttpRequest::get("/api/orders"), page);
    Endpoint::json(request.query_opt("status", status.map(OrderStatus::as_str)))
}

pub fn place_order(input: &OrderInput) -> Result<Endpoint<Order>, ApiError> {
    Ok(Endpoint::json(HttpRequest::post("/api/orders").json(input)?))
}

pub fn cancel_order(id: i64) -> Endpoint<Order> {
    Endpoint::json(HttpRequest::put(format!("/api/orders/{id}/cancel")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{assert_shape, body, query};
    use crate::http::HttpMethod;

    #[test]
    fn list_orders_with_status_filter() {
        let endpoint = list_orders(PageQuery::default(), Some(OrderStatus::Paid));
        assert_shape(&endpoint, HttpMethod::Get, "/api/orders");
        assert_eq!(
            query(&endpoint),
            vec![("page", "1"), ("pageSize", "10"), ("status", "paid")]
        );
    }

    #[test]
    fn place_and_cancel() {
        let place = place_order(&OrderInput {
            user_id: 1,
            screening_id: 8,
            seats: vec!["A1".to_string(), "A2".to_string()],
        })
        .unwrap();
        assert_shape(&place, HttpMethod::Post, "/api/orders");
        assert_eq!(body(&place)["seats"], serde_json::json!(["A1", "A2"]));

        let cancel = cancel_order(8);
        assert_shape(&cancel, HttpMethod::Put, "/api/orders/8/cancel");
        assert!(cancel.request().body.is_none());
    }
}
