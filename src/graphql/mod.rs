//! GraphQL codec.
//!
//! # Data Flow
//! ```text
//! Operation (kind, root field, arguments, selection)
//!     → operation.rs (document text, JSON body, POST {endpoint}/graphql)
//!     → Invoker
//!     → response.rs (status check, errors list, data.<field> → T)
//! ```
//!
//! # Design Decisions
//! - Operations address exactly one root field; its value is the call result
//! - Argument and selection text is passed through verbatim
//! - A non-empty `errors` list fails the call even when `data` is present

pub mod operation;
pub mod response;

pub use operation::{Operation, OperationInfo, OperationKind};
pub use response::{decode, GraphqlError};
