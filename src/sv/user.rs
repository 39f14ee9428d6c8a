use crate::{
  entity::{user, user::UserRole},
  prelude::*,
};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Register a user record (admin only)
  pub async fn create(
    &self,
    actor: &Actor,
    id: i64,
    name: &str,
    role: UserRole,
  ) -> Result<user::Model> {
    actor.require_admin()?;

    let name = name.trim();
    if name.is_empty() {
      return Err(Error::InvalidArgs("Name is required".into()));
    }

    if self.by_id(id).await?.is_some() {
      return Err(Error::InvalidArgs(format!("User {id} already exists")));
    }

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      id: Set(id),
      name: Set(name.to_string()),
      role: Set(role),
      created_at: Set(now),
    }
    .insert(self.db)
    .await?;

    info!("User {} registered as {:?} by {}", id, role, actor.id);
    Ok(user)
  }

  pub async fn by_id(&self, id: i64) -> Result<Option<user::Model>> {
    let user = user::Entity::find_by_id(id).one(self.db).await?;
    Ok(user)
  }

  /// Resolve an agent, rejecting ids that belong to other roles
  pub async fn agent(&self, id: i64) -> Result<user::Model> {
    let user = self.by_id(id).await?.ok_or(Error::UserNotFound)?;

    if user.role != UserRole::Agent {
      return Err(Error::InvalidArgs(format!("User {id} is not an agent")));
    }

    Ok(user)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::{ADMIN, test_db};

  #[tokio::test]
  async fn test_create_requires_admin() {
    let db = test_db::setup().await;
    let patient = Actor::new(5, UserRole::Patient);

    let result =
      User::new(&db).create(&patient, 10, "Agent Smith", UserRole::Agent).await;
    assert!(matches!(result, Err(Error::Forbidden)));
  }

  #[tokio::test]
  async fn test_create_and_resolve_agent() {
    let db = test_db::setup().await;

    let user = User::new(&db)
      .create(&ADMIN, 10, "  Agent Smith ", UserRole::Agent)
      .await
      .unwrap();
    assert_eq!(user.name, "Agent Smith");

    let agent = User::new(&db).agent(10).await.unwrap();
    assert_eq!(agent.id, 10);

    let duplicate =
      User::new(&db).create(&ADMIN, 10, "Other", UserRole::Agent).await;
    assert!(matches!(duplicate, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn test_agent_rejects_other_roles() {
    let db = test_db::setup().await;

    User::new(&db).create(&ADMIN, 11, "Dr. Who", UserRole::Doctor).await.unwrap();

    assert!(matches!(User::new(&db).agent(11).await, Err(Error::InvalidArgs(_))));
    assert!(matches!(User::new(&db).agent(12).await, Err(Error::UserNotFound)));
  }
}
