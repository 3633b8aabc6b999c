//! Reference application served by the binary.
//!
//! - any unrouted request → `404 Not Found`
//! - `GET /` → echoes the request header fields
//! - `GET|PUT /person?name=..` → in-memory person store

pub mod fields;
pub mod person;

use std::sync::Arc;

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::router::{RouteError, Router};

pub use fields::echo_fields;
pub use person::{PersonHandler, PersonStore};

/// Builds the application route table around an injected person store.
pub fn router(store: Arc<PersonStore>) -> Result<Router, RouteError> {
    let mut router = Router::new();
    router
        .add_default_handler_all(not_found)
        .add_route("/", &[Method::GET], echo_fields)?
        .add_route("/person", &[Method::GET, Method::PUT], PersonHandler::new(store))?;
    Ok(router)
}

fn not_found(_: &Request) -> Response {
    ResponseBuilder::new(StatusCode::NotFound)
        .body("Not Found")
        .build()
}
