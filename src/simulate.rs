pub(crate) mod config;
pub(crate) mod grid;
pub(crate) mod simulator;
pub(crate) mod text;
