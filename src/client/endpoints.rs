//! Request shapes of the authentication service contract
//!
//! | Call | Method | Path | Auth |
//! |---|---|---|---|
//! | register | POST | `/register` | none |
//! | login | POST | `/login` | none |
//! | get user | GET | `/users/id/{id}` | bearer (optional) |
//! | update password | PUT | `/users/id/{id}/password` | bearer |
//! | update username | PUT | `/users/id/{id}/username` | bearer |
//! | logout | POST | `/logout` | bearer |

use super::{ApiRequest, Method};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters escaped in a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn user_path(user_id: &str) -> String {
    format!("/users/id/{}", utf8_percent_encode(user_id, SEGMENT))
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordUpdateBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsernameUpdateBody<'a> {
    current_username: &'a str,
    new_username: &'a str,
}

fn to_value<T: Serialize>(body: &T) -> Value {
    // Plain string-field structs always serialize.
    serde_json::to_value(body).unwrap_or(Value::Null)
}

/// `POST /register`; `email` is omitted for the preflight's throwaway payload
pub fn register(username: &str, password: &str, email: Option<&str>) -> ApiRequest {
    ApiRequest::new(Method::Post, "/register").with_json(to_value(&RegisterBody {
        username,
        password,
        email,
    }))
}

/// `POST /login`
pub fn login(username: &str, password: &str) -> ApiRequest {
    ApiRequest::new(Method::Post, "/login").with_json(to_value(&LoginBody { username, password }))
}

/// `GET /users/id/{id}`, authenticated only when a token is given
pub fn get_user(user_id: &str, token: Option<&str>) -> ApiRequest {
    let request = ApiRequest::new(Method::Get, user_path(user_id));
    match token {
        Some(token) => request.with_bearer(token),
        None => request,
    }
}

/// `PUT /users/id/{id}/password`
pub fn update_password(
    user_id: &str,
    token: &str,
    current_password: &str,
    new_password: &str,
) -> ApiRequest {
    ApiRequest::new(Method::Put, format!("{}/password", user_path(user_id)))
        .with_bearer(token)
        .with_json(to_value(&PasswordUpdateBody {
            current_password,
            new_password,
        }))
}

/// `PUT /users/id/{id}/username`
pub fn update_username(
    user_id: &str,
    token: &str,
    current_username: &str,
    new_username: &str,
) -> ApiRequest {
    ApiRequest::new(Method::Put, format!("{}/username", user_path(user_id)))
        .with_bearer(token)
        .with_json(to_value(&UsernameUpdateBody {
            current_username,
            new_username,
        }))
}

/// `POST /logout`
pub fn logout(token: &str) -> ApiRequest {
    ApiRequest::new(Method::Post, "/logout").with_bearer(token)
}

/// Login response body.
///
/// Only `token` and `id` matter to the lifecycle; `id` is a UUID string on
/// the reference service but numeric ids are accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    id: Option<Value>,
}

impl LoginResponse {
    /// Parse a login body, `None` when it is not a JSON object
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// Non-empty token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Non-empty user id rendered as a string
    pub fn user_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
