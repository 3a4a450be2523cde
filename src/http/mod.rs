pub mod body;
pub mod connection;
pub mod dispatch;
pub mod request;
pub mod response;

pub use body::BodyStore;
pub use connection::HttpConn;
pub use dispatch::{Dispatch, Responder};
pub use request::{BodyLocation, Method, ParseError, ParsedRequest};
pub use response::HttpResponse;
