// src/project/mod.rs

//! Project-level concerns: locating the site root and the small commands
//! that create or clean up parts of it.

pub mod root;
pub mod scaffold;

pub use root::{ProjectRoot, SOURCE_DIR, resolve_from_cwd, resolve_root};
pub use scaffold::{SKELETON_DIRS, clear_output, init_site, new_record, record_template};
