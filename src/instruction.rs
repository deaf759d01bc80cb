pub(crate) mod action;
pub(crate) mod model;
pub(crate) mod sequence;
