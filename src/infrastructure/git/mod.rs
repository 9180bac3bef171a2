//! Git backend that shells out to the `git` CLI.

pub mod cli;

pub use cli::{validate_branch_name, GitCli};
