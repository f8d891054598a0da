//! Error types for ditra-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type, shared across the workspace.
///
/// Variants follow the three-way taxonomy of the administrative model:
/// client/input errors (rejected operations, no partial state change),
/// programming/invariant errors (conforming parsers never produce them),
/// and propagated directory-layer failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed distinguished name text
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Malformed subtree-specification text (client error)
    #[error("Invalid subtree specification: {0}")]
    InvalidSubtreeSpecification(String),

    /// Refinement leaf asserts an attribute other than objectClass
    /// (programming error: a conforming parser fixes the attribute)
    #[error("Invalid refinement assertion: {0}")]
    InvalidAssertion(String),

    /// Structurally invalid refinement text (parse-time condition)
    #[error("Malformed refinement: {0}")]
    MalformedRefinement(String),

    /// Subentry added under an entry with no administrative role (client error)
    #[error("No administrative point: {0}")]
    NoAdministrativePoint(String),

    /// Deletion of an entry that still governs subordinates
    #[error("Not allowed on non-leaf: {0}")]
    NotAllowedOnNonLeaf(String),

    /// Rename/move of an entry that is or contains an administrative point
    #[error("Not allowed on RDN: {0}")]
    NotAllowedOnRdn(String),

    /// Target entry missing during a maintenance pass
    #[error("No such entry: {0}")]
    NoSuchEntry(String),

    /// Failure propagated unchanged from the directory-mutation layer
    #[error("Directory error: {0}")]
    Directory(String),
}

impl Error {
    /// Create an invalid name error
    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Error::InvalidName(msg.into())
    }

    /// Create an invalid subtree specification error
    pub fn invalid_subtree_specification(msg: impl Into<String>) -> Self {
        Error::InvalidSubtreeSpecification(msg.into())
    }

    /// Create an invalid assertion error
    pub fn invalid_assertion(msg: impl Into<String>) -> Self {
        Error::InvalidAssertion(msg.into())
    }

    /// Create a malformed refinement error
    pub fn malformed_refinement(msg: impl Into<String>) -> Self {
        Error::MalformedRefinement(msg.into())
    }

    /// Create a no-administrative-point error
    pub fn no_administrative_point(msg: impl Into<String>) -> Self {
        Error::NoAdministrativePoint(msg.into())
    }

    /// Create a not-allowed-on-non-leaf error
    pub fn not_allowed_on_non_leaf(msg: impl Into<String>) -> Self {
        Error::NotAllowedOnNonLeaf(msg.into())
    }

    /// Create a not-allowed-on-RDN error
    pub fn not_allowed_on_rdn(msg: impl Into<String>) -> Self {
        Error::NotAllowedOnRdn(msg.into())
    }

    /// Create a no-such-entry error
    pub fn no_such_entry(msg: impl Into<String>) -> Self {
        Error::NoSuchEntry(msg.into())
    }

    /// Create a directory error
    pub fn directory(msg: impl Into<String>) -> Self {
        Error::Directory(msg.into())
    }

    /// True for errors the protocol layer reports to the client as a
    /// rejected operation (as opposed to defects or storage failures).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidName(_)
                | Error::InvalidSubtreeSpecification(_)
                | Error::MalformedRefinement(_)
                | Error::NoAdministrativePoint(_)
                | Error::NotAllowedOnNonLeaf(_)
                | Error::NotAllowedOnRdn(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_taxonomy() {
        // Rejected operations: the client's input is at fault and no
        // partial state change occurred.
        assert!(Error::invalid_name("x").is_client_error());
        assert!(Error::invalid_subtree_specification("x").is_client_error());
        assert!(Error::malformed_refinement("x").is_client_error());
        assert!(Error::no_administrative_point("x").is_client_error());
        assert!(Error::not_allowed_on_non_leaf("x").is_client_error());
        assert!(Error::not_allowed_on_rdn("x").is_client_error());

        // Invariant violations and storage failures are not.
        assert!(!Error::invalid_assertion("x").is_client_error());
        assert!(!Error::no_such_entry("x").is_client_error());
        assert!(!Error::directory("x").is_client_error());
    }
}
