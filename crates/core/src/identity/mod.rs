//! Holder attributes, their field encoding and the derived identifier

pub mod did;
pub mod preprocess;
pub mod types;

pub use did::{check_did, compute_did, Did};
pub use preprocess::{encode_attributes, EncodedAttributes};
pub use types::{AttributeSet, RawAttributes};
