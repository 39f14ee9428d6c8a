use crate::{entity::UserRole, prelude::*};

/// Identified caller of an operation. Always passed in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub id: i64,
  pub role: UserRole,
}

impl Actor {
  pub fn new(id: i64, role: UserRole) -> Self {
    Self { id, role }
  }

  pub fn is_admin(&self) -> bool {
    self.role == UserRole::Admin
  }

  pub fn require_admin(&self) -> Result<()> {
    if self.is_admin() { Ok(()) } else { Err(Error::Forbidden) }
  }

  /// Admins may act for anyone, everyone else only for themselves.
  pub fn require_self_or_admin(&self, user_id: i64) -> Result<()> {
    if self.is_admin() || self.id == user_id {
      Ok(())
    } else {
      Err(Error::Forbidden)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_admin_checks() {
    let admin = Actor::new(1, UserRole::Admin);
    let agent = Actor::new(2, UserRole::Agent);

    assert!(admin.require_admin().is_ok());
    assert!(matches!(agent.require_admin(), Err(Error::Forbidden)));

    assert!(admin.require_self_or_admin(2).is_ok());
    assert!(agent.require_self_or_admin(2).is_ok());
    assert!(matches!(agent.require_self_or_admin(3), Err(Error::Forbidden)));
  }
}
