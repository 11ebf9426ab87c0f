use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Database;

/// Роль назначается организатором через админку, бот её не меняет.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Listener,
    Expert,
    Manager,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::Listener, Role::Expert, Role::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Listener => "listener",
            Role::Expert => "expert",
            Role::Manager => "manager",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "listener" => Some(Role::Listener),
            "expert" => Some(Role::Expert),
            "manager" => Some(Role::Manager),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "Участник",
            Role::Listener => "Слушатель",
            Role::Expert => "Эксперт",
            Role::Manager => "Организатор",
        }
    }

    /// Кому адресована рассылка — для сводки перед подтверждением.
    pub fn audience_label(&self) -> &'static str {
        match self {
            Role::User => "Участникам",
            Role::Listener => "Слушателям",
            Role::Expert => "Экспертам",
            Role::Manager => "Организаторам",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub tg_id: Option<i64>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub map_url: String,
    pub role: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    pub async fn by_tg_id(db: &Database, tg_id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, tg_id, username, first_name, last_name, map_url, role
             FROM users WHERE tg_id = $1",
        )
        .bind(tg_id)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn by_id(db: &Database, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, tg_id, username, first_name, last_name, map_url, role
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn by_username(db: &Database, username: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, tg_id, username, first_name, last_name, map_url, role
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn by_full_name(
        db: &Database,
        last_name: &str,
        first_name: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, tg_id, username, first_name, last_name, map_url, role
             FROM users WHERE last_name = $1 AND first_name = $2",
        )
        .bind(last_name)
        .bind(first_name)
        .fetch_optional(&db.pool)
        .await
    }

    pub async fn role_of(db: &Database, tg_id: i64) -> sqlx::Result<Option<Role>> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE tg_id = $1")
            .bind(tg_id)
            .fetch_optional(&db.pool)
            .await?;

        Ok(role.as_deref().and_then(Role::parse))
    }

    /// Регистрация: участник заведён организатором заранее, бот лишь
    /// привязывает tg_id к username.
    pub async fn register(db: &Database, tg_id: i64, username: &str) -> sqlx::Result<bool> {
        let updated = sqlx::query("UPDATE users SET tg_id = $1, updated_at = NOW() WHERE username = $2")
            .bind(tg_id)
            .bind(username)
            .execute(&db.pool)
            .await?
            .rows_affected();

        Ok(updated > 0)
    }

    pub async fn is_registered(db: &Database, tg_id: i64) -> sqlx::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE tg_id = $1")
            .bind(tg_id)
            .fetch_optional(&db.pool)
            .await?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_db_strings() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("admin"), None);
    }
}
