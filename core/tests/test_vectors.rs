//! Check bindings and response handling against JSON vectors in `test-vectors/`.
//!
//! Each vector file lists inputs and expected outcomes. Request bodies are
//! compared as parsed JSON so field order does not matter. Responses are fed
//! through the standard client chain by a canned transport, so no server is
//! involved.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use ticket_core::api::{comments, export, homepage, likes, movies, orders, screenings, user};
use ticket_core::{
    ApiClient, ApiError, ClientConfig, Credentials, Endpoint, HttpMethod, HttpRequest,
    HttpResponse, LikeKey, OrderStatus, PageQuery, PasswordReset, ResponseKind, Transport,
    TransportError,
};

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn request_of<R>(endpoint: Endpoint<R>) -> HttpRequest {
    endpoint.into_parts().0
}

fn build(name: &str) -> HttpRequest {
    let key = LikeKey { uid: 1, mid: 2 };
    match name {
        "list_all_films" => request_of(homepage::list_all_films()),
        "list_hot_films" => request_of(homepage::list_hot_films()),
        "update_likes" => request_of(homepage::update_likes(7, true).unwrap()),
        "add_like" => request_of(likes::add_like(key).unwrap()),
        "delete_like" => request_of(likes::delete_like(key)),
        "get_like" => request_of(likes::get_like(key)),
        "user_info" => request_of(user::user_info()),
        "login" => request_of(
            user::login(&Credentials {
                username: "alice".to_string(),
                password: "secret".to_string(),
            })
            .unwrap(),
        ),
        "list_users" => request_of(user::list_users(
            PageQuery {
                page: 2,
                page_size: 5,
            },
            Some("al"),
        )),
        "reset_password" => request_of(
            user::reset_password(&PasswordReset {
                old_pwd: "a".to_string(),
                new_pwd: "b".to_string(),
                re_pwd: "b".to_string(),
            })
            .unwrap(),
        ),
        "delete_movie" => request_of(movies::delete_movie(12)),
        "list_screenings" => request_of(screenings::list_screenings(3)),
        "delete_screening" => request_of(screenings::delete_screening(9)),
        "list_comments" => request_of(comments::list_comments(3)),
        "list_orders" => request_of(orders::list_orders(
            PageQuery::default(),
            Some(OrderStatus::Paid),
        )),
        "cancel_order" => request_of(orders::cancel_order(4)),
        "export_data" => request_of(export::export_data(2024)),
        other => panic!("no binding for vector {other}"),
    }
}

#[test]
fn endpoint_vectors() {
    let raw = include_str!("../../test-vectors/endpoints.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let req = build(name);

        assert_eq!(req.method, parse_method(case["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, case["path"].as_str().unwrap(), "{name}: path");

        let expected_query: Vec<(String, String)> = case["query"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                let pair = pair.as_array().unwrap();
                (
                    pair[0].as_str().unwrap().to_string(),
                    pair[1].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(req.query, expected_query, "{name}: query");

        match &case["body"] {
            Value::Null => assert!(req.body.is_none(), "{name}: unexpected body"),
            expected => {
                let body = req.body.as_ref().unwrap();
                let actual: Value = serde_json::from_slice(body.as_bytes()).unwrap();
                assert_eq!(&actual, expected, "{name}: body");
            }
        }

        if let Some(content_type) = case.get("content_type").and_then(Value::as_str) {
            assert_eq!(req.header_value("content-type"), Some(content_type), "{name}: content type");
        }

        let expected_kind = if case["binary"].as_bool().unwrap_or(false) {
            ResponseKind::Binary
        } else {
            ResponseKind::Json
        };
        assert_eq!(req.response_kind, expected_kind, "{name}: response kind");
    }
}

/// Answers every request with the same status and body.
struct Canned {
    status: u16,
    body: Vec<u8>,
}

impl Transport for Canned {
    fn execute(&self, _url: &str, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: self.status,
            headers: Vec::new(),
            body: self.body.clone(),
        })
    }
}

fn client_with(status: u16, body: &str, notes: Arc<Mutex<Vec<String>>>) -> ApiClient<Canned> {
    let notifier = move |message: &str| notes.lock().push(message.to_string());
    ApiClient::builder(ClientConfig::new("http://localhost:8080"))
        .notifier(Arc::new(notifier))
        .build_with(Canned {
            status,
            body: body.as_bytes().to_vec(),
        })
}

#[test]
fn envelope_vectors() {
    let raw = include_str!("../../test-vectors/envelope.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let notes = Arc::new(Mutex::new(Vec::new()));
        let client = client_with(200, case["body"].as_str().unwrap(), notes.clone());

        let result = client.call(Endpoint::<Value>::json(HttpRequest::get("/api/anything")));

        let expected = &case["expected"];
        match expected["error"].as_str() {
            None => assert_eq!(result.unwrap(), expected["data"], "{name}: data"),
            Some("application") => assert_eq!(
                result.unwrap_err(),
                ApiError::Application {
                    code: expected["code"].as_i64().unwrap(),
                    message: expected["message"].as_str().unwrap().to_string(),
                },
                "{name}: error"
            ),
            Some("decode") => assert!(
                matches!(result, Err(ApiError::Decode(_))),
                "{name}: expected decode error, got {result:?}"
            ),
            Some(other) => panic!("{name}: unknown error kind {other}"),
        }

        let expected_notes: Vec<String> = case["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n.as_str().unwrap().to_string())
            .collect();
        assert_eq!(*notes.lock(), expected_notes, "{name}: notifications");
    }
}

#[test]
fn blob_error_vectors() {
    let raw = include_str!("../../test-vectors/blob_errors.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let notes = Arc::new(Mutex::new(Vec::new()));
        let client = client_with(status, case["body"].as_str().unwrap(), notes.clone());

        let err = client.call(export::export_data(2024)).unwrap_err();

        assert_eq!(
            err,
            ApiError::Server {
                status,
                message: case["message"].as_str().unwrap().to_string(),
            },
            "{name}"
        );
        // Failed downloads only get the generic notice.
        assert_eq!(*notes.lock(), ["service error"], "{name}: notifications");
    }
}
