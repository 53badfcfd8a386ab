//! Shared harness: an in-memory app with one `USER` and one `ADMIN` account.

#![allow(dead_code)]

use std::collections::BTreeSet;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use cinerate_api::{AppState, config::ApiConfig};
use cinerate_core::auth::Role;
use cinerate_core::auth::password::hash_password;
use cinerate_core::models::catalog::NewMovie;
use cinerate_core::store::Stores;
use serde_json::Value;
use tower::ServiceExt;

pub const USER: (&str, &str) = ("user", "admin");
pub const ADMIN: (&str, &str) = ("admin", "admin");

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub user_id: i64,
    pub admin_id: i64,
}

impl TestApp {
    pub async fn new() -> Self {
        let stores = Stores::in_memory();
        let user_id = stores
            .users
            .create(USER.0, &hash_password(USER.1).unwrap(), &BTreeSet::from([Role::User]))
            .await
            .unwrap();
        let admin_id = stores
            .users
            .create(ADMIN.0, &hash_password(ADMIN.1).unwrap(), &BTreeSet::from([Role::Admin]))
            .await
            .unwrap();

        let state = AppState::new(ApiConfig::with_secret("integration-test-secret"), stores);
        let router = cinerate_api::router(state.clone());
        Self {
            state,
            router,
            user_id,
            admin_id,
        }
    }

    /// Insert a movie directly through the store.
    pub async fn add_movie(&self, title: &str, genre: &str, year: i32) -> i64 {
        self.state
            .stores
            .movies
            .insert(&NewMovie {
                title: title.into(),
                genre: Some(genre.into()),
                release_year: Some(year),
            })
            .await
            .unwrap()
            .id
    }

    /// Send a request; returns status and parsed JSON body (`Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse JSON")
        };
        (status, json)
    }

    /// Log in and return the issued token.
    pub async fn login(&self, (username, password): (&str, &str)) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token field").to_string()
    }
}
