//! Named document collections and their URL slugs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Field on every owned record that references the owning student.
pub const OWNER_FIELD: &str = "studentId";

/// A named collection in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    Students,
    BorrowedBooks,
    OffenseList,
    PaymentList,
    Notices,
    Admins,
}

impl Collection {
    /// Every collection, in a stable order.
    pub const ALL: [Self; 6] = [
        Self::Students,
        Self::BorrowedBooks,
        Self::OffenseList,
        Self::PaymentList,
        Self::Notices,
        Self::Admins,
    ];

    /// Storage name of the collection (the document-store key).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Students => "Students",
            Self::BorrowedBooks => "BorrowedBooks",
            Self::OffenseList => "OffenseList",
            Self::PaymentList => "PaymentList",
            Self::Notices => "Notices",
            Self::Admins => "Admins",
        }
    }

    /// URL path segment used by the HTTP surface.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::BorrowedBooks => "borrowed-books",
            Self::OffenseList => "offenses",
            Self::PaymentList => "payments",
            Self::Notices => "notices",
            Self::Admins => "admins",
        }
    }

    /// Singular entity name used in error messages.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Students => "Student",
            Self::BorrowedBooks => "BorrowedBook",
            Self::OffenseList => "Offense",
            Self::PaymentList => "Payment",
            Self::Notices => "Notice",
            Self::Admins => "Admin",
        }
    }

    /// Whether the generic CRUD surface may touch this collection.
    ///
    /// `Admins` holds credential documents and is only read by the login flow.
    pub fn is_managed(self) -> bool {
        !matches!(self, Self::Admins)
    }

    /// Resolve a storage name (e.g. `"OffenseList"`).
    pub fn from_storage_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = CoreError;

    /// Parse a URL slug (e.g. `"borrowed-books"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown collection '{s}'")))
    }
}
