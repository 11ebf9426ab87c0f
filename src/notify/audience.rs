use crate::database::Database;
use crate::notify::{Recipient, Selector};

/// Разрешить селектор в снимок получателей. Веер работает только по
/// этому снимку: изменения ролей во время рассылки его не трогают.
/// Пользователи без привязанного tg_id опускаются сразу.
pub async fn resolve(db: &Database, selector: &Selector) -> sqlx::Result<Vec<Recipient>> {
    let chat_ids: Vec<i64> = match selector {
        Selector::Roles(roles) => {
            let names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
            sqlx::query_scalar(
                "SELECT tg_id FROM users
                 WHERE role = ANY($1) AND tg_id IS NOT NULL
                 ORDER BY last_name, first_name",
            )
            .bind(&names)
            .fetch_all(&db.pool)
            .await?
        }
        Selector::Activity(id) => {
            sqlx::query_scalar(
                "SELECT u.tg_id FROM activity_records r
                 JOIN users u ON u.id = r.user_id
                 WHERE r.activity_id = $1 AND u.tg_id IS NOT NULL
                 ORDER BY u.last_name, u.first_name",
            )
            .bind(id)
            .fetch_all(&db.pool)
            .await?
        }
        Selector::Consultation(id) => {
            sqlx::query_scalar(
                "SELECT u.tg_id FROM consultation_records r
                 JOIN users u ON u.id = r.user_id
                 WHERE r.slot_id = $1 AND u.tg_id IS NOT NULL
                 ORDER BY u.last_name, u.first_name",
            )
            .bind(id)
            .fetch_all(&db.pool)
            .await?
        }
        Selector::Event(_) | Selector::AllNonManagers => {
            sqlx::query_scalar(
                "SELECT tg_id FROM users
                 WHERE role <> 'manager' AND tg_id IS NOT NULL
                 ORDER BY last_name, first_name",
            )
            .fetch_all(&db.pool)
            .await?
        }
        Selector::Person(id) => {
            sqlx::query_scalar("SELECT tg_id FROM users WHERE id = $1 AND tg_id IS NOT NULL")
                .bind(id)
                .fetch_all(&db.pool)
                .await?
        }
    };

    Ok(chat_ids.into_iter().map(|chat_id| Recipient { chat_id }).collect())
}
