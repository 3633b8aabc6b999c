use nanohttp::http::parser::{parse_headers, parse_request, ParseError, RequestParser, BUFFER_CAPACITY};
use nanohttp::http::request::Method;
use nanohttp::http::response::StatusCode;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path(), "/");
    assert_eq!(parsed.query(), None);
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert!(parsed.body.is_none());
}

#[test]
fn test_parse_post_request_with_body() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.path(), "/api");
    assert_eq!(parsed.body(), b"hello");
}

#[test]
fn test_parse_patch_request_with_body() {
    let req = b"PATCH /item HTTP/1.0\r\nContent-Length: 3\r\n\r\nabc";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.method, Method::PATCH);
    assert_eq!(parsed.body(), b"abc");
}

#[test]
fn test_parse_multiple_headers() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(parsed.headers.get("User-Agent").unwrap(), "test-client");
    assert_eq!(parsed.headers.get("Accept").unwrap(), "*/*");
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.path(), "/search");
    assert_eq!(parsed.query(), Some("q=rust"));
}

#[test]
fn test_parse_target_dot_segments_resolved() {
    let parsed = parse_request(b"GET /a/./b/../c HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.path(), "/a/c");
}

#[test]
fn test_parse_missing_separator() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let result = parse_request(req);

    assert_eq!(result.unwrap_err(), ParseError::NoHeaderSeparator);
}

#[test]
fn test_parse_invalid_http_method() {
    let req = b"INVALID / HTTP/1.1\r\n\r\n";

    assert_eq!(parse_request(req).unwrap_err(), ParseError::InvalidMethod);
}

#[test]
fn test_parse_method_is_case_sensitive() {
    let req = b"get / HTTP/1.1\r\n\r\n";

    assert_eq!(parse_request(req).unwrap_err(), ParseError::InvalidMethod);
}

#[test]
fn test_parse_methods_outside_supported_set() {
    for method in ["HEAD", "OPTIONS", "CONNECT", "TRACE"] {
        let req = format!("{} / HTTP/1.1\r\n\r\n", method);
        assert_eq!(
            parse_request(req.as_bytes()).unwrap_err(),
            ParseError::InvalidMethod
        );
    }
}

#[test]
fn test_parse_invalid_uri() {
    let targets = [
        "http://[bad",
        "/a%zz",
        "/%",
        "/a%2",
        "/a{b}",
        "/<x>",
        "/a\\..\\b",
        "/a|b",
        "/caf\u{e9}",
        "/a\"b",
    ];

    for target in targets {
        let req = format!("GET {} HTTP/1.1\r\n\r\n", target);
        assert!(
            matches!(parse_request(req.as_bytes()), Err(ParseError::InvalidUri(_))),
            "target {:?}",
            target
        );
    }
}

#[test]
fn test_parse_valid_uri_characters() {
    let req = b"GET /a-b._~c/%41;x=1,y@z!$&'()*+?q=%2F&r=:/ HTTP/1.1\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.path(), "/a-b._~c/%41;x=1,y@z!$&'()*+");
    assert_eq!(parsed.query(), Some("q=%2F&r=:/"));
}

#[test]
fn test_parse_missing_target() {
    let req = b"GET\r\n\r\n";

    assert!(matches!(parse_request(req), Err(ParseError::InvalidUri(_))));
}

#[test]
fn test_parse_unsupported_versions() {
    for version in ["HTTP/2.5", "HTTP/2.0", "HTTP/1.", "HTTP/1.x", "HTTP/1.11", "HTTP/1.1 "] {
        let req = format!("GET / {}\r\n\r\n", version);
        assert_eq!(
            parse_request(req.as_bytes()).unwrap_err(),
            ParseError::UnsupportedVersion,
            "version {:?}",
            version
        );
    }
}

#[test]
fn test_parse_accepts_any_http1_minor_version() {
    for version in ["HTTP/1.0", "HTTP/1.1", "HTTP/1.7"] {
        let req = format!("GET / {}\r\n\r\n", version);
        assert!(parse_request(req.as_bytes()).is_ok());
    }
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";

    assert_eq!(parse_request(req).unwrap_err(), ParseError::MalformedHeader);
}

#[test]
fn test_parse_folded_header_rejected() {
    let space = b"GET / HTTP/1.1\r\nX-A: one\r\n X-B: two\r\n\r\n";
    let tab = b"GET / HTTP/1.1\r\nX-A: one\r\n\tX-B: two\r\n\r\n";

    assert_eq!(parse_request(space).unwrap_err(), ParseError::ObsoleteLineFolding);
    assert_eq!(parse_request(tab).unwrap_err(), ParseError::ObsoleteLineFolding);
}

#[test]
fn test_parse_invalid_header_names() {
    for line in ["Bad Name: x", "Bad@Name: x", ": x", "Na(me): x"] {
        let req = format!("GET / HTTP/1.1\r\n{}\r\n\r\n", line);
        assert!(matches!(
            parse_request(req.as_bytes()),
            Err(ParseError::InvalidHeaderName(_))
        ));
    }
}

#[test]
fn test_parse_token_punctuation_in_header_name() {
    let req = b"GET / HTTP/1.1\r\nX!#$%&'*+-.^_`|~1: ok\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.header("X!#$%&'*+-.^_`|~1"), Some("ok"));
}

#[test]
fn test_parse_header_value_trimmed() {
    let req = b"GET / HTTP/1.1\r\nX-Pad: \t padded value \t\r\nX-Empty:\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.header("X-Pad"), Some("padded value"));
    assert_eq!(parsed.header("X-Empty"), Some(""));
}

#[test]
fn test_parse_header_value_keeps_colons() {
    let req = b"GET / HTTP/1.1\r\nHost: localhost:8080\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.header("Host"), Some("localhost:8080"));
}

#[test]
fn test_parse_duplicate_header_last_wins() {
    let req = b"GET / HTTP/1.1\r\nX-Dup: first\r\nX-Dup: second\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.header("X-Dup"), Some("second"));
}

#[test]
fn test_parse_header_names_are_case_sensitive_keys() {
    let req = b"GET / HTTP/1.1\r\nContent-Type: application/json\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert!(parsed.headers.contains_key("Content-Type"));
    assert!(!parsed.headers.contains_key("content-type"));
    assert_eq!(parsed.header_ignore_case("content-type"), Some("application/json"));
}

#[test]
fn test_parse_body_methods_require_content_length() {
    for method in ["POST", "PUT", "PATCH"] {
        let req = format!("{} /x HTTP/1.1\r\nHost: a\r\n\r\nbody", method);
        assert_eq!(
            parse_request(req.as_bytes()).unwrap_err(),
            ParseError::ContentLengthRequired
        );
    }
}

#[test]
fn test_parse_invalid_content_length() {
    for value in ["abc", "-1", "+5", "1 2", ""] {
        let req = format!("PUT /x HTTP/1.1\r\nContent-Length: {}\r\n\r\n", value);
        assert!(matches!(
            parse_request(req.as_bytes()),
            Err(ParseError::InvalidContentLength(_))
        ));
    }
}

#[test]
fn test_parse_content_length_case_insensitive_lookup() {
    let req = b"PUT /x HTTP/1.1\r\ncontent-length: 2\r\n\r\nok";

    assert_eq!(parse_request(req).unwrap().body(), b"ok");
}

#[test]
fn test_parse_get_and_delete_never_read_body() {
    for method in ["GET", "DELETE"] {
        let req = format!("{} /x HTTP/1.1\r\nContent-Length: 4\r\n\r\nbody", method);
        let parsed = parse_request(req.as_bytes()).unwrap();
        assert!(parsed.body.is_none());
        assert!(parsed.body().is_empty());
    }
}

#[test]
fn test_parse_delete_ignores_declared_body() {
    let mut parser = RequestParser::new();
    let parsed = parser
        .feed(b"DELETE /x HTTP/1.1\r\nContent-Length: 100\r\n\r\n")
        .unwrap();

    assert_eq!(parsed.unwrap().method, Method::DELETE);
}

#[test]
fn test_parse_excess_body_bytes_dropped() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcdef";

    assert_eq!(parse_request(req).unwrap().body(), b"abc");
}

#[test]
fn test_parse_request_with_empty_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.body(), b"");
    assert!(parsed.body.is_some());
}

#[test]
fn test_parse_request_with_binary_body() {
    let req = b"POST /upload HTTP/1.1\r\nContent-Length: 6\r\n\r\n\x00\x01\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.body(), b"\x00\x01\r\n\r\n");
}

#[test]
fn test_parse_truncated_body() {
    let mut req = b"PUT /person?name=alice HTTP/1.1\r\nContent-Length: 1000\r\n\r\n".to_vec();
    req.extend_from_slice(&[b'x'; 10]);

    assert_eq!(
        parse_request(&req).unwrap_err(),
        ParseError::TruncatedBody {
            expected: 1000,
            received: 10
        }
    );
}

#[test]
fn test_parse_body_assembled_from_many_feeds() {
    let body: Vec<u8> = (0..=255u8).cycle().take(20_000).collect();
    let mut wire = format!("PUT /blob HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
    wire.extend_from_slice(&body);

    for chunk_size in [1, 7, 1024, 8192] {
        let mut parser = RequestParser::new();
        let mut result = None;
        for chunk in wire.chunks(chunk_size) {
            if let Some(req) = parser.feed(chunk).unwrap() {
                result = Some(req);
            }
        }
        let req = result.expect("request should complete");
        assert_eq!(req.body(), &body[..], "chunk size {}", chunk_size);
    }
}

#[test]
fn test_parse_incremental_reports_pending() {
    let mut parser = RequestParser::new();

    assert!(parser.feed(b"POST /api HTTP/1.1\r\n").unwrap().is_none());
    assert!(parser.has_received_data());
    assert_eq!(parser.end_of_stream(), ParseError::NoHeaderSeparator);

    assert!(parser.feed(b"Content-Length: 5\r\n\r\nhel").unwrap().is_none());
    assert_eq!(
        parser.end_of_stream(),
        ParseError::TruncatedBody {
            expected: 5,
            received: 3
        }
    );

    let req = parser.feed(b"lo").unwrap().unwrap();
    assert_eq!(req.body(), b"hello");
}

#[test]
fn test_parse_header_block_too_large() {
    let mut parser = RequestParser::new();
    let filler = format!("GET / HTTP/1.1\r\nX-Fill: {}", "a".repeat(BUFFER_CAPACITY));

    assert_eq!(
        parser.feed(filler.as_bytes()).unwrap_err(),
        ParseError::HeaderTooLarge {
            limit: BUFFER_CAPACITY
        }
    );
}

#[test]
fn test_parse_non_utf8_header_rejected() {
    let req = b"GET / HTTP/1.1\r\nX-Bin: \xff\xfe\r\n\r\n";

    assert_eq!(parse_request(req).unwrap_err(), ParseError::InvalidEncoding);
}

#[test]
fn test_parse_errors_all_map_to_bad_request() {
    let errors = [
        ParseError::NoHeaderSeparator,
        ParseError::HeaderTooLarge { limit: BUFFER_CAPACITY },
        ParseError::InvalidEncoding,
        ParseError::InvalidMethod,
        ParseError::InvalidUri("x".to_string()),
        ParseError::UnsupportedVersion,
        ParseError::ObsoleteLineFolding,
        ParseError::MalformedHeader,
        ParseError::InvalidHeaderName("x y".to_string()),
        ParseError::ContentLengthRequired,
        ParseError::InvalidContentLength("abc".to_string()),
        ParseError::TruncatedBody { expected: 10, received: 1 },
    ];

    for err in errors {
        assert_eq!(err.status(), StatusCode::BadRequest, "{:?}", err);
    }
}

#[test]
fn test_parse_headers_directly() {
    let headers = parse_headers(["A: 1", "B:2"]).unwrap();

    assert_eq!(headers.get("A").unwrap(), "1");
    assert_eq!(headers.get("B").unwrap(), "2");
}
