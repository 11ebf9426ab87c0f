//! Атомарные операции над вместимостью слота. Любое изменение
//! occupied идёт одним условным UPDATE: раздельные чтение и запись
//! возвращают гонку за последнее место.

use crate::database::Database;

/// Занять место. `true` — место удержано, `false` — слот полон или
/// выключен (проигрыш гонки).
pub async fn try_occupy(db: &Database, slot_id: i64) -> sqlx::Result<bool> {
    let updated = sqlx::query(
        "UPDATE consultation_slots
         SET occupied = occupied + 1, updated_at = NOW()
         WHERE id = $1 AND is_active AND occupied < capacity",
    )
    .bind(slot_id)
    .execute(&db.pool)
    .await?
    .rows_affected();

    Ok(updated == 1)
}

/// Вернуть место. Не уводит счётчик ниже нуля.
pub async fn release(db: &Database, slot_id: i64) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE consultation_slots
         SET occupied = GREATEST(occupied - 1, 0), updated_at = NOW()
         WHERE id = $1",
    )
    .bind(slot_id)
    .execute(&db.pool)
    .await?;

    Ok(())
}

pub async fn insert_record(db: &Database, user_id: i64, slot_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO consultation_records (user_id, slot_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(slot_id)
        .execute(&db.pool)
        .await?;

    Ok(())
}

/// Удалить ровно одну запись пользователя на слот и вернуть место.
/// Оба изменения идут одной транзакцией: occupied обязан совпадать
/// с числом живых записей и на путях с ошибкой.
pub async fn delete_record_and_release(
    db: &Database,
    tg_id: i64,
    slot_id: i64,
) -> sqlx::Result<bool> {
    let mut tx = db.pool.begin().await?;

    let deleted = sqlx::query(
        "DELETE FROM consultation_records
         WHERE id = (
             SELECT r.id FROM consultation_records r
             JOIN users u ON u.id = r.user_id
             WHERE r.slot_id = $1 AND u.tg_id = $2
             LIMIT 1
         )",
    )
    .bind(slot_id)
    .bind(tg_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if deleted == 1 {
        sqlx::query(
            "UPDATE consultation_slots
             SET occupied = GREATEST(occupied - 1, 0), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(slot_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(deleted == 1)
}
