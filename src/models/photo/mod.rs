pub mod endpoints;
pub mod form;
pub mod queries;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use types::*;

crate::make_object_id!(PhotoId, pho);
