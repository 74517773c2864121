//! Script and word markup parsing.

pub(crate) mod script;
pub(crate) mod token;
