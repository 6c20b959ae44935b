//! Testing utilities and fixtures for promptvault.
//!
//! - **Fixtures**: temporary project directories holding a prompt tree
//! - **Content**: sample prompt documents and configuration snippets
//!
//! # Example Usage
//!
//! ```rust
//! use promptvault_test_utils::TestPromptTree;
//!
//! let tree = TestPromptTree::new()
//!     .with_sample_prompts()
//!     .with_prompt("notes/debug.log", "noise")
//!     .build();
//!
//! assert!(tree.prompts_dir().join("generic/metric_1.yaml").exists());
//! assert_eq!(tree.prompt_files().len(), 4);
//! ```

pub mod fixtures;

pub use fixtures::{content, BuiltTestPromptTree, TestPromptTree};
