use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use tracing::debug;

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::router::Handler;

/// In-memory name → data store shared by the person routes.
#[derive(Debug, Default)]
pub struct PersonStore {
    persons: RwLock<HashMap<String, Bytes>>,
}

impl PersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `name`, returning the previous value.
    pub fn put(&self, name: impl Into<String>, data: Bytes) -> Option<Bytes> {
        self.persons
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.into(), data)
    }

    pub fn get(&self, name: &str) -> Option<Bytes> {
        self.persons
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.persons
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `GET` and `PUT` on `/person?name=<name>`.
pub struct PersonHandler {
    store: Arc<PersonStore>,
}

impl PersonHandler {
    pub fn new(store: Arc<PersonStore>) -> Self {
        Self { store }
    }
}

impl Handler for PersonHandler {
    fn handle(&self, request: &Request) -> Response {
        let Some(name) = request.target.query_param("name") else {
            return ResponseBuilder::new(StatusCode::BadRequest)
                .body("Should specify name in the query\n")
                .build();
        };

        match request.method {
            Method::PUT => {
                let data = request.body.clone().unwrap_or_default();
                debug!(name = %name, bytes = data.len(), "storing person");
                match self.store.put(name, data) {
                    None => Response::empty(StatusCode::Created),
                    Some(_) => Response::empty(StatusCode::Ok),
                }
            }
            Method::GET => match self.store.get(&name) {
                Some(data) => Response::ok(data.to_vec()),
                None => Response::empty(StatusCode::NotFound),
            },
            _ => Response::empty(StatusCode::NotImplemented),
        }
    }
}
