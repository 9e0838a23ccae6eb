//! Debug dumps of outgoing requests and incoming responses.
//!
//! Each dump is a single-line JSON document logged at `debug` level:
//!
//! ```text
//! {"method":"POST","url":"/users?id=1","protocol":"HTTP/1.1","headers":{"content-type":"application/json"},"body":{"id":1}}
//! {"status":"200 OK","protocol":"HTTP/1.1","headers":{"content-length":"8"},"body":{"id":1}}
//! ```
//!
//! JSON bodies are embedded as JSON, `text/*` bodies as strings. Other bodies
//! are left out. Header values marked sensitive render as `"Sensitive"`.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Request, Response};
use restwire_core::is_json;
use serde_json::{Map, Value};

fn enabled() -> bool {
    tracing::enabled!(tracing::Level::DEBUG)
}

pub(crate) fn log_request(req: &Request<Bytes>) {
    if enabled() {
        tracing::debug!("{}", request_dump(req));
    }
}

pub(crate) fn log_response(res: &Response<Bytes>) {
    if enabled() {
        tracing::debug!("{}", response_dump(res));
    }
}

pub(crate) fn request_dump(req: &Request<Bytes>) -> Value {
    let mut dump = Map::new();
    dump.insert("method".into(), req.method().as_str().into());
    let url = req
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    dump.insert("url".into(), url.into());
    dump.insert("protocol".into(), format!("{:?}", req.version()).into());
    dump.insert("headers".into(), headers(req.headers()));
    if let Some(body) = body(req.headers(), req.body()) {
        dump.insert("body".into(), body);
    }
    Value::Object(dump)
}

pub(crate) fn response_dump(res: &Response<Bytes>) -> Value {
    let mut dump = Map::new();
    dump.insert("status".into(), res.status().to_string().into());
    dump.insert("protocol".into(), format!("{:?}", res.version()).into());
    dump.insert("headers".into(), headers(res.headers()));
    if let Some(body) = body(res.headers(), res.body()) {
        dump.insert("body".into(), body);
    }
    Value::Object(dump)
}

// Single-valued headers render as a string, repeated ones as an array.
fn headers(map: &HeaderMap) -> Value {
    let mut out = Map::new();
    for name in map.keys() {
        let mut values: Vec<Value> = map
            .get_all(name)
            .iter()
            .map(|v| {
                if v.is_sensitive() {
                    Value::from("Sensitive")
                } else {
                    String::from_utf8_lossy(v.as_bytes()).into_owned().into()
                }
            })
            .collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        out.insert(name.as_str().to_owned(), value);
    }
    Value::Object(out)
}

fn body(headers: &HeaderMap, body: &Bytes) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    if is_json(content_type) {
        serde_json::from_slice(body).ok()
    } else if content_type.starts_with("text/") {
        Some(String::from_utf8_lossy(body).into_owned().into())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http::header::{ACCEPT, AUTHORIZATION, SET_COOKIE};
    use http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_request_dump() {
        let req = Request::builder()
            .method("POST")
            .uri("http://localhost:8080/users/alice?verbose=1")
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(Bytes::from_static(br#"{"email":"alice@foo.com"}"#))
            .unwrap();

        assert_eq!(
            request_dump(&req),
            json!({
                "method": "POST",
                "url": "/users/alice?verbose=1",
                "protocol": "HTTP/1.1",
                "headers": {
                    "content-type": "application/json",
                    "accept": "application/json",
                },
                "body": {"email": "alice@foo.com"},
            })
        );
    }

    #[test]
    fn test_response_dump_repeated_headers_and_text() {
        let res = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(SET_COOKIE, "a=1")
            .header(SET_COOKIE, "b=2")
            .body(Bytes::from_static(b"not found\n"))
            .unwrap();

        assert_eq!(
            response_dump(&res),
            json!({
                "status": "404 Not Found",
                "protocol": "HTTP/1.1",
                "headers": {
                    "content-type": "text/plain; charset=utf-8",
                    "set-cookie": ["a=1", "b=2"],
                },
                "body": "not found\n",
            })
        );
    }

    #[test]
    fn test_sensitive_header_is_redacted() {
        let mut token = HeaderValue::from_static("Bearer s3cret");
        token.set_sensitive(true);
        let mut req = Request::builder()
            .uri("http://localhost/users")
            .header(ACCEPT, "application/json")
            .body(Bytes::new())
            .unwrap();
        req.headers_mut().insert(AUTHORIZATION, token);

        let dump = request_dump(&req);
        assert_eq!(dump["headers"]["authorization"], "Sensitive");
        assert_eq!(dump["headers"]["accept"], "application/json");
    }

    #[test]
    fn test_binary_body_is_omitted() {
        let res = Response::builder()
            .header(CONTENT_TYPE, "application/protobuf")
            .body(Bytes::from_static(&[0x0a, 0x01, 0x61]))
            .unwrap();
        let dump = response_dump(&res);
        assert!(dump.get("body").is_none());
        assert_eq!(dump["status"], "200 OK");
    }
}
