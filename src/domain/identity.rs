use uuid::Uuid;

use super::errors::DomainError;

/// Role name carried by administrator tokens.
pub const ADMIN_ROLE: &str = "AppAdmin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Identity {
    /// Passes administrators through and rejects everyone else with `Forbidden`.
    pub fn require_admin(self) -> Result<Self, DomainError> {
        if self.is_admin {
            Ok(self)
        } else {
            Err(DomainError::Forbidden(format!(
                "user {} is not an administrator",
                self.user_id
            )))
        }
    }
}

/// Which rows a caller may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    OwnedBy(Uuid),
}

impl Visibility {
    pub fn for_identity(identity: &Identity) -> Self {
        if identity.is_admin {
            Visibility::All
        } else {
            Visibility::OwnedBy(identity.user_id)
        }
    }

    pub fn permits(&self, owner: Uuid) -> bool {
        match self {
            Visibility::All => true,
            Visibility::OwnedBy(user_id) => *user_id == owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_administrators_pass_the_admin_gate() {
        let user_id = Uuid::new_v4();
        let admin = Identity {
            user_id,
            is_admin: true,
        };
        assert_eq!(admin.clone().require_admin(), Ok(admin));

        let diner = Identity {
            user_id,
            is_admin: false,
        };
        assert!(matches!(
            diner.require_admin(),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn visibility_follows_the_role() {
        let owner = Uuid::new_v4();
        let own = Visibility::for_identity(&Identity {
            user_id: owner,
            is_admin: false,
        });
        assert!(own.permits(owner));
        assert!(!own.permits(Uuid::new_v4()));
    }
}
