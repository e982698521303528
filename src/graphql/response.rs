//! GraphQL response decoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::transport::HttpResponse;

/// One entry of a response's `errors` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphqlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
            extensions: None,
        }
    }
}

impl std::fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

/// Decode the value of root field `field` from a buffered response.
pub fn decode<T: DeserializeOwned>(response: HttpResponse, field: &str) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = String::from_utf8_lossy(response.body()).into_owned();
        return Err(ClientError::Status { status, body });
    }

    let envelope: Envelope = serde_json::from_slice(response.body())?;
    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        return Err(ClientError::Graphql(errors));
    }

    let value = match envelope.data {
        Some(Value::Object(mut data)) => data.remove(field).unwrap_or(Value::Null),
        _ => Value::Null,
    };
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Bytes;
    use hyper::StatusCode;

    fn response(status: u16, body: &'static str) -> HttpResponse {
        hyper::Response::builder()
            .status(status)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Book {
        title: String,
    }

    #[test]
    fn test_decode_field() {
        let books: Vec<Book> = decode(
            response(200, r#"{"data":{"books":[{"title":"Dune"}]}}"#),
            "books",
        )
        .unwrap();
        assert_eq!(books, vec![Book { title: "Dune".into() }]);
    }

    #[test]
    fn test_missing_field_is_null() {
        let value: Option<Book> = decode(response(200, r#"{"data":{}}"#), "book").unwrap();
        assert!(value.is_none());

        let value: Option<Book> = decode(response(200, r#"{"data":null}"#), "book").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_null_or_empty_errors_ignored() {
        let title: String = decode(response(200, r#"{"data":{"title":"Dune"},"errors":null}"#), "title").unwrap();
        assert_eq!(title, "Dune");

        let title: String = decode(response(200, r#"{"data":{"title":"Emma"},"errors":[]}"#), "title").unwrap();
        assert_eq!(title, "Emma");
    }

    #[test]
    fn test_errors_take_precedence() {
        let err = decode::<Value>(
            response(
                200,
                r#"{"data":null,"errors":[{"message":"denied","path":["book"],"extensions":{"code":"FORBIDDEN"}}]}"#,
            ),
            "book",
        )
        .unwrap_err();
        match err {
            ClientError::Graphql(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].message, "denied");
                assert_eq!(errors[0].path, vec![Value::from("book")]);
                assert_eq!(errors[0].extensions.as_ref().unwrap()["code"], "FORBIDDEN");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_non_success_status() {
        let err = decode::<Value>(response(503, "unavailable"), "book").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status { status, ref body } if status == StatusCode::SERVICE_UNAVAILABLE && body == "unavailable"
        ));
    }

    #[test]
    fn test_type_mismatch_is_json_error() {
        let err = decode::<Book>(response(200, r#"{"data":{"book":42}}"#), "book").unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }
}
