use std::collections::BTreeMap;

use crate::http::request::Request;
use crate::http::response::Response;

/// Lists the request's header fields, one `name:\tvalue` line each, sorted by name.
pub fn echo_fields(request: &Request) -> Response {
    let sorted: BTreeMap<_, _> = request.headers.iter().collect();

    let mut body = String::from("Your fields are:\n");
    for (name, value) in sorted {
        body.push_str(name);
        body.push_str(":\t");
        body.push_str(value);
        body.push('\n');
    }

    Response::ok(body)
}
