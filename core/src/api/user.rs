//! Authentication and user administration.

use tracing::info;

use crate::client::ApiClient;
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::session::SessionStore;
use crate::transport::Transport;
use crate::types::{Credentials, Page, PageQuery, PasswordReset, UserInfo, UserSession};

/// Exchange credentials for a session token.
pub fn login(credentials: &Credentials) -> Result<Endpoint<String>, ApiError> {
    Ok(Endpoint::json(
        HttpRequest::post("/api/user/login").json(credentials)?,
    ))
}

/// The user behind the current session.
pub fn user_info() -> Endpoint<UserInfo> {
    Endpoint::json(HttpRequest::get("/api/auth/getInfo"))
}

pub fn list_users(page: PageQuery, keyword: Option<&str>) -> Endpoint<Page<UserInfo>> {
    let request = super::paged(HttpRequest::get("/api/user/list"), page);
    Endpoint::json(request.query_opt("keyword", keyword))
}

pub fn reset_password(reset: &PasswordReset) -> Result<Endpoint<()>, ApiError> {
    Ok(Endpoint::json(
        HttpRequest::put("/api/user/resetPassword").json(reset)?,
    ))
}

/// Log in, fetch the user's profile with the new token, and store both.
///
/// The session is only written once both calls succeed.
pub fn sign_in<T: Transport>(
    client: &ApiClient<T>,
    session: &SessionStore<UserSession>,
    credentials: &Credentials,
) -> Result<UserInfo, ApiError> {
    let token = client.call(login(credentials)?)?;
    let user = client.call(user_info().with_header("authorization", token.clone()))?;
    info!(user = %user.username, "signed in");
    session.set(UserSession {
        token,
        user: user.clone(),
    });
    Ok(user)
}

pub fn sign_out(session: &SessionStore<UserSession>) {
    session.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{assert_shape, body, query};
    use crate::http::HttpMethod;

    #[test]
    fn login_posts_credentials() {
        let endpoint = login(&Credentials {
            username: "alice".to_string(),
            password: "secret".to_string(),
        })
        .unwrap();
        assert_shape(&endpoint, HttpMethod::Post, "/api/user/login");
        assert_eq!(
            body(&endpoint),
            serde_json::json!({ "username": "alice", "password": "secret" })
        );
    }

    #[test]
    fn user_info_is_a_get() {
        assert_shape(&user_info(), HttpMethod::Get, "/api/auth/getInfo");
    }

    #[test]
    fn list_users_pages_and_filters() {
        let endpoint = list_users(PageQuery { page: 2, page_size: 20 }, Some("ali"));
        assert_shape(&endpoint, HttpMethod::Get, "/api/user/list");
        assert_eq!(
            query(&endpoint),
            vec![("page", "2"), ("pageSize", "20"), ("keyword", "ali")]
        );

        let endpoint = list_users(PageQuery::default(), None);
        assert_eq!(query(&endpoint), vec![("page", "1"), ("pageSize", "10")]);
    }

    #[test]
    fn reset_password_puts_body() {
        let endpoint = reset_password(&PasswordReset {
            old_pwd: "a".to_string(),
            new_pwd: "b".to_string(),
            re_pwd: "b".to_string(),
        })
        .unwrap();
        assert_shape(&endpoint, HttpMethod::Put, "/api/user/resetPassword");
        assert_eq!(
            body(&endpoint),
            serde_json::json!({ "oldPwd": "a", "newPwd": "b", "rePwd": "b" })
        );
    }
}
