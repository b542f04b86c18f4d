//! Mutation handlers, one module per entity kind.
//!
//! Every handler works on an [`Edit`](crate::edit::Edit) working copy and
//! either completes or returns an error; the facade discards the working
//! copy on error.

mod column;
mod constraint;
mod index;
mod relationship;
mod schema;
mod table;

pub(crate) use column::{check_data_type, types_compatible};
