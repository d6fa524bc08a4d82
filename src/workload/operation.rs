//! Operation kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of request issued against a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Operation {
    Insert,
    Read,
    Update,
    Scan,
    ReadModifyWrite,
    Delete,
}

impl Operation {
    /// Every kind, in reporting order
    pub const ALL: [Operation; 6] = [
        Operation::Insert,
        Operation::Read,
        Operation::Update,
        Operation::Scan,
        Operation::ReadModifyWrite,
        Operation::Delete,
    ];

    /// Number of kinds
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index into per-kind tables
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in status lines and reports
    pub fn name(self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Read => "READ",
            Operation::Update => "UPDATE",
            Operation::Scan => "SCAN",
            Operation::ReadModifyWrite => "READ-MODIFY-WRITE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
