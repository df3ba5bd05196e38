//! Output generation.
//!
//! The result set is always printed to stdout as a JSON array. With
//! `--json-output-dir` it is also saved to disk:
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── us-page1.json
//!     └── kr-page2.json
//! ```

pub mod json;
