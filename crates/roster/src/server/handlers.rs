//! Route handlers.
//!
//! Handlers only translate between HTTP and [`State`]; the behavior lives in
//! the state methods.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use tide::http::mime;
use tide::{Request, StatusCode};

use super::response;
use super::State;
use crate::args::UserArgs;
use crate::error::{Error, Result};

/// Body of the landing page.
pub const HOME_PAGE: &str = "<h1>Hello World!</h1>";

/// `GET /`
pub async fn home(_req: Request<State>) -> tide::Result {
    Ok(response::html(HOME_PAGE))
}

/// `GET /api/users/`
pub async fn list_users(req: Request<State>) -> tide::Result {
    let result = req.state().list_users().await;
    reply(req.state(), StatusCode::Ok, result)
}

/// `POST /api/users/`
///
/// Responds 201 with the full list of users, including the new one.
pub async fn create_user(mut req: Request<State>) -> tide::Result {
    let result = match read_args(&mut req).await {
        Ok(args) => req.state().create_user(&args).await,
        Err(err) => Err(err),
    };
    reply(req.state(), StatusCode::Created, result)
}

/// `GET /api/users/:email`
pub async fn get_user(req: Request<State>) -> tide::Result {
    let result = match email_param(&req) {
        Ok(email) => req.state().get_user(&email).await,
        Err(err) => Err(err),
    };
    reply(req.state(), StatusCode::Ok, result)
}

/// `PATCH /api/users/:email`
pub async fn update_user(mut req: Request<State>) -> tide::Result {
    let email = match email_param(&req) {
        Ok(email) => email,
        Err(err) => return response::error(&err, req.state().debug()),
    };
    let result = match read_args(&mut req).await {
        Ok(args) => req.state().update_user(&email, &args).await,
        Err(err) => Err(err),
    };
    reply(req.state(), StatusCode::Ok, result)
}

/// `DELETE /api/users/:email`
pub async fn delete_user(req: Request<State>) -> tide::Result {
    let result = match email_param(&req) {
        Ok(email) => req.state().delete_user(&email).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => Ok(response::no_content()),
        Err(err) => response::error(&err, req.state().debug()),
    }
}

fn reply<T: Serialize>(state: &State, status: StatusCode, result: Result<T>) -> tide::Result {
    match result {
        Ok(value) => response::json(status, &value),
        Err(err) => response::error(&err, state.debug()),
    }
}

/// The `:email` path segment, percent-decoded.
fn email_param(req: &Request<State>) -> Result<String> {
    let raw = req
        .param("email")
        .map_err(|e| Error::MalformedBody(e.to_string()))?;
    percent_decode_str(raw)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| Error::MalformedBody(format!("invalid email in path: {e}")))
}

/// Read user arguments from the body, falling back to the query string for
/// any field the body leaves out.
async fn read_args(req: &mut Request<State>) -> Result<UserArgs> {
    let query: UserArgs = req
        .query()
        .map_err(|e| Error::MalformedBody(format!("invalid query string: {e}")))?;

    let is_form = req
        .content_type()
        .is_some_and(|m| m.essence() == mime::FORM.essence());

    let body = if is_form {
        req.body_form::<UserArgs>()
            .await
            .map_err(|e| Error::MalformedBody(e.to_string()))?
    } else {
        let text = req
            .body_string()
            .await
            .map_err(|e| Error::MalformedBody(e.to_string()))?;
        if text.trim().is_empty() {
            UserArgs::default()
        } else {
            serde_json::from_str(&text).map_err(|e| Error::MalformedBody(e.to_string()))?
        }
    };

    Ok(body.or(query))
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tide::http::{Method, Request as HttpRequest, Response as HttpResponse, Url};
    use tide::Body;

    use super::*;
    use crate::args::Validator;
    use crate::config::ValidationConfig;
    use crate::server::app;
    use crate::storage::Storage;

    fn test_app() -> tide::Server<State> {
        crate::logging::init_test_logging();
        let storage = Storage::open_in_memory().unwrap();
        let validator = Validator::from_config(&ValidationConfig::default()).unwrap();
        app(State::new(storage, validator, false))
    }

    fn request(method: Method, path: &str) -> HttpRequest {
        HttpRequest::new(method, Url::parse(&format!("http://localhost{path}")).unwrap())
    }

    fn json_request(method: Method, path: &str, body: &Value) -> HttpRequest {
        let mut req = request(method, path);
        req.set_body(Body::from_json(body).unwrap());
        req
    }

    async fn send(app: &tide::Server<State>, req: HttpRequest) -> HttpResponse {
        app.respond(req).await.unwrap()
    }

    async fn create_ada(app: &tide::Server<State>) {
        let res = send(
            app,
            json_request(
                Method::Post,
                "/api/users/",
                &json!({"email": "ada@example.com", "first_name": "Ada", "last_name": "Lovelace"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::Created);
    }

    #[async_std::test]
    async fn test_home() {
        let app = test_app();
        let mut res = send(&app, request(Method::Get, "/")).await;

        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(res.body_string().await.unwrap(), HOME_PAGE);
    }

    #[async_std::test]
    async fn test_list_empty() {
        let app = test_app();
        let mut res = send(&app, request(Method::Get, "/api/users/")).await;

        assert_eq!(res.status(), StatusCode::Ok);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(body, json!([]));
    }

    #[async_std::test]
    async fn test_collection_without_trailing_slash() {
        let app = test_app();
        create_ada(&app).await;

        let mut res = send(&app, request(Method::Get, "/api/users")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[async_std::test]
    async fn test_create_returns_list() {
        let app = test_app();
        let mut res = send(
            &app,
            json_request(
                Method::Post,
                "/api/users/",
                &json!({"email": "ada@example.com", "first_name": "Ada", "last_name": "Lovelace"}),
            ),
        )
        .await;

        assert_eq!(res.status(), StatusCode::Created);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(
            body,
            json!([{"id": 1, "email": "ada@example.com", "first_name": "Ada", "last_name": "Lovelace"}])
        );
    }

    #[async_std::test]
    async fn test_create_missing_field() {
        let app = test_app();
        let mut res = send(
            &app,
            json_request(
                Method::Post,
                "/api/users/",
                &json!({"email": "ada@example.com", "first_name": "Ada"}),
            ),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BadRequest);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(
            body,
            json!({"message": {"last_name": "Surname can't be blank"}})
        );
    }

    #[async_std::test]
    async fn test_create_duplicate() {
        let app = test_app();
        create_ada(&app).await;

        let mut res = send(
            &app,
            json_request(
                Method::Post,
                "/api/users/",
                &json!({"email": "ada@example.com", "first_name": "Augusta", "last_name": "King"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::Conflict);
        let body: Value = res.body_json().await.unwrap();
        assert!(body["message"].as_str().unwrap().contains("ada@example.com"));
    }

    #[async_std::test]
    async fn test_create_malformed_json() {
        let app = test_app();
        let mut req = request(Method::Post, "/api/users/");
        req.set_body("{not json");
        req.set_content_type(mime::JSON);

        let res = send(&app, req).await;
        assert_eq!(res.status(), StatusCode::BadRequest);
    }

    #[async_std::test]
    async fn test_create_with_numeric_name() {
        let app = test_app();
        let mut res = send(
            &app,
            json_request(
                Method::Post,
                "/api/users/",
                &json!({"email": "ada@example.com", "first_name": 5, "last_name": "Lovelace"}),
            ),
        )
        .await;

        assert_eq!(res.status(), StatusCode::Created);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(body[0]["first_name"], "5");
    }

    #[async_std::test]
    async fn test_create_from_form() {
        let app = test_app();
        let mut req = request(Method::Post, "/api/users/");
        req.set_body("email=ada%40example.com&first_name=Ada&last_name=Lovelace");
        req.set_content_type(mime::FORM);

        let mut res = send(&app, req).await;
        assert_eq!(res.status(), StatusCode::Created);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(body[0]["email"], "ada@example.com");
    }

    #[async_std::test]
    async fn test_create_from_query_string() {
        let app = test_app();
        let req = request(
            Method::Post,
            "/api/users/?email=ada%40example.com&first_name=Ada&last_name=Lovelace",
        );

        let res = send(&app, req).await;
        assert_eq!(res.status(), StatusCode::Created);
    }

    #[async_std::test]
    async fn test_get_user() {
        let app = test_app();
        create_ada(&app).await;

        let mut res = send(&app, request(Method::Get, "/api/users/ada@example.com")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(body["first_name"], "Ada");
        assert_eq!(body["last_name"], "Lovelace");
    }

    #[async_std::test]
    async fn test_get_missing_user() {
        let app = test_app();
        let mut res = send(&app, request(Method::Get, "/api/users/nobody@example.com")).await;

        assert_eq!(res.status(), StatusCode::NotFound);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(body, json!({"message": "User Not Found!"}));
    }

    #[async_std::test]
    async fn test_patch_user() {
        let app = test_app();
        create_ada(&app).await;

        let mut res = send(
            &app,
            json_request(
                Method::Patch,
                "/api/users/ada@example.com",
                &json!({"email": "ada@example.com", "first_name": "Augusta", "last_name": "King"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::Ok);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(
            body,
            json!({"id": 1, "email": "ada@example.com", "first_name": "Augusta", "last_name": "King"})
        );
    }

    #[async_std::test]
    async fn test_patch_missing_user() {
        let app = test_app();
        let res = send(
            &app,
            json_request(
                Method::Patch,
                "/api/users/nobody@example.com",
                &json!({"email": "nobody@example.com", "first_name": "No", "last_name": "Body"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[async_std::test]
    async fn test_patch_requires_all_arguments() {
        let app = test_app();
        create_ada(&app).await;

        let mut res = send(
            &app,
            json_request(
                Method::Patch,
                "/api/users/ada@example.com",
                &json!({"first_name": "Augusta", "last_name": "King"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BadRequest);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(body["message"]["email"], "Email can't be blank");
    }

    #[async_std::test]
    async fn test_delete_user() {
        let app = test_app();
        create_ada(&app).await;

        let mut res = send(&app, request(Method::Delete, "/api/users/ada@example.com")).await;
        assert_eq!(res.status(), StatusCode::NoContent);
        assert!(res.body_string().await.unwrap().is_empty());

        let res = send(&app, request(Method::Get, "/api/users/ada@example.com")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[async_std::test]
    async fn test_encoded_email_in_path() {
        let app = test_app();
        create_ada(&app).await;

        let mut res = send(&app, request(Method::Get, "/api/users/ada%40example.com")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        let body: Value = res.body_json().await.unwrap();
        assert_eq!(body["email"], "ada@example.com");

        let res = send(
            &app,
            json_request(
                Method::Patch,
                "/api/users/ada%40example.com",
                &json!({"email": "ada@example.com", "first_name": "Augusta", "last_name": "King"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::Ok);

        let res = send(&app, request(Method::Delete, "/api/users/ada%40example.com")).await;
        assert_eq!(res.status(), StatusCode::NoContent);

        let res = send(&app, request(Method::Get, "/api/users/ada@example.com")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }

    #[async_std::test]
    async fn test_undecodable_email_in_path() {
        let app = test_app();
        let res = send(&app, request(Method::Get, "/api/users/%FF%FE")).await;
        assert_eq!(res.status(), StatusCode::BadRequest);
    }

    #[async_std::test]
    async fn test_delete_missing_user() {
        let app = test_app();
        let res = send(&app, request(Method::Delete, "/api/users/nobody@example.com")).await;
        assert_eq!(res.status(), StatusCode::NotFound);
    }
}
