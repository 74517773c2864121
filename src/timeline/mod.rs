pub(crate) mod builder;
pub(crate) mod drift;
pub(crate) mod model;
