//! Admin access policy for directory mutations.
//!
//! The privileged identity is configuration, not code: `admin_emails` lists
//! the accounts allowed to create, edit and delete links. Identities are
//! compared case-insensitively after trimming.

use crate::Error;

/// Decides whether an authenticated identity may mutate the directory.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admins: Vec<String>,
}

impl AdminPolicy {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admins = admins
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { admins }
    }

    pub fn is_admin(&self, identity: &str) -> bool {
        let identity = identity.trim().to_lowercase();
        !identity.is_empty() && self.admins.iter().any(|a| *a == identity)
    }

    /// Require an admin identity.
    ///
    /// # Errors
    ///
    /// `Error::Unauthorized` when no identity is present,
    /// `Error::Forbidden` when it is not an admin.
    pub fn authorize(&self, identity: Option<&str>) -> Result<(), Error> {
        match identity.map(str::trim).filter(|s| !s.is_empty()) {
            None => Err(Error::Unauthorized),
            Some(id) if self.is_admin(id) => Ok(()),
            Some(id) => Err(Error::Forbidden(format!("{id} is not an admin"))),
        }
    }
}
