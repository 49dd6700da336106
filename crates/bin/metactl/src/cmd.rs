//! metactl commands.

pub mod add;
pub mod list;
pub mod sort;
pub mod update;
