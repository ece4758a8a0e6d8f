//! Version command

use crate::version_line;

/// Print the version and commit.
pub fn version() {
    println!("{}", version_line());
}
