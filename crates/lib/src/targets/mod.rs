//! Per-dependency build orchestrators.

pub mod boost;
pub mod openssl;
pub mod v8;

pub use boost::Boost;
pub use openssl::OpenSsl;
pub use v8::V8;
