//! GraphQL operations and their HTTP encoding.

use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use hyper::{Method, Request, Uri};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::transport::HttpRequest;

/// Query or mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata carried in request extensions for the layers below the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInfo {
    pub kind: OperationKind,
    pub name: String,
}

/// A single root-field operation.
///
/// ```text
/// Operation::query("books").arguments("first: 2").selection("title")
///     → query { books(first: 2) { title } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    kind: OperationKind,
    name: String,
    arguments: String,
    selection: String,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    query: &'a str,
}

impl Operation {
    pub fn new(kind: OperationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            arguments: String::new(),
            selection: String::new(),
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(OperationKind::Query, name)
    }

    pub fn mutation(name: impl Into<String>) -> Self {
        Self::new(OperationKind::Mutation, name)
    }

    /// Raw argument text placed between the parentheses.
    pub fn arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = arguments.into();
        self
    }

    /// Raw selection set placed between the braces.
    pub fn selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = selection.into();
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the GraphQL document.
    pub fn document(&self) -> String {
        let mut field = self.name.clone();
        let arguments = self.arguments.trim();
        if !arguments.is_empty() {
            field.push('(');
            field.push_str(arguments);
            field.push(')');
        }
        let selection = self.selection.trim();
        if !selection.is_empty() {
            field.push_str(" { ");
            field.push_str(selection);
            field.push_str(" }");
        }
        format!("{} {{ {} }}", self.kind, field)
    }

    /// Encode as a POST to the GraphQL URL.
    pub fn to_request(&self, url: &Uri) -> ClientResult<HttpRequest> {
        let document = self.document();
        let body = serde_json::to_vec(&RequestBody { query: &document })?;

        let mut request = Request::builder()
            .method(Method::POST)
            .uri(url.clone())
            .body(Bytes::from(body))
            .map_err(|e| ClientError::InvalidConfig(format!("cannot build request: {}", e)))?;

        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        request.extensions_mut().insert(OperationInfo {
            kind: self.kind,
            name: self.name.clone(),
        });

        Ok(request)
    }
}
