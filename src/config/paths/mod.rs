//! Filesystem locations for configuration and per-root data.

pub(crate) mod xdg_root;
