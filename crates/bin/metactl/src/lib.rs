//! metactl maintains the sqd-network dataset metadata document.

pub mod args;
pub mod cmd;
pub mod logging;
pub mod ui;
