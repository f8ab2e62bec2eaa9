use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// One front/back study card owned by a single user.
///
/// `image_url` is null until the illustration flow has produced one; once set
/// it is never cleared or regenerated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Flashcard {
    pub id: Uuid,
    pub user_id: String,
    pub front: String,
    pub back: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFlashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateFlashcard {
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub async fn create(
        pool: &SqlitePool,
        card_id: Uuid,
        user_id: &str,
        data: &CreateFlashcard,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Flashcard>(
            r#"INSERT INTO flashcards (id, user_id, front, back)
               VALUES ($1, $2, $3, $4)
               RETURNING id, user_id, front, back, image_url, created_at, updated_at"#,
        )
        .bind(card_id)
        .bind(user_id)
        .bind(&data.front)
        .bind(&data.back)
        .fetch_one(pool)
        .await
    }

    pub async fn find_for_user(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Flashcard>(
            r#"SELECT id, user_id, front, back, image_url, created_at, updated_at
               FROM flashcards
               WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Flashcard>(
            r#"SELECT id, user_id, front, back, image_url, created_at, updated_at
               FROM flashcards
               WHERE user_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_for_user(pool: &SqlitePool, user_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM flashcards WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Edit front/back text. Returns `None` when the card does not exist or
    /// belongs to another user.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &UpdateFlashcard,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Flashcard>(
            r#"UPDATE flashcards
               SET front = $3, back = $4, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND user_id = $2
               RETURNING id, user_id, front, back, image_url, created_at, updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.front)
        .bind(&data.back)
        .fetch_optional(pool)
        .await
    }

    /// Persist the generated illustration URL, re-scoped by owner.
    pub async fn set_image_url(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        image_url: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE flashcards
               SET image_url = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(image_url)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    fn card_data(front: &str, back: &str) -> CreateFlashcard {
        CreateFlashcard {
            front: front.to_string(),
            back: back.to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_find_are_owner_scoped() {
        let pool = test_pool().await;
        let id = Uuid::new_v4();

        let card = Flashcard::create(&pool, id, "user-a", &card_data("Epidermis", "Outer skin"))
            .await
            .unwrap();
        assert_eq!(card.id, id);
        assert_eq!(card.user_id, "user-a");
        assert!(card.image_url.is_none());

        let found = Flashcard::find_for_user(&pool, id, "user-a").await.unwrap();
        assert!(found.is_some());

        let foreign = Flashcard::find_for_user(&pool, id, "user-b").await.unwrap();
        assert!(foreign.is_none());
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let pool = test_pool().await;

        let first = Uuid::new_v4();
        Flashcard::create(&pool, first, "user-a", &card_data("q1", "a1"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = Uuid::new_v4();
        Flashcard::create(&pool, second, "user-a", &card_data("q2", "a2"))
            .await
            .unwrap();

        let cards = Flashcard::list_for_user(&pool, "user-a").await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, second);
        assert_eq!(cards[1].id, first);
    }

    #[tokio::test]
    async fn count_only_sees_own_cards() {
        let pool = test_pool().await;
        Flashcard::create(&pool, Uuid::new_v4(), "user-a", &card_data("q", "a"))
            .await
            .unwrap();
        Flashcard::create(&pool, Uuid::new_v4(), "user-b", &card_data("q", "a"))
            .await
            .unwrap();

        assert_eq!(Flashcard::count_for_user(&pool, "user-a").await.unwrap(), 1);
        assert_eq!(Flashcard::count_for_user(&pool, "user-c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_edits_text_for_owner_only() {
        let pool = test_pool().await;
        let id = Uuid::new_v4();
        Flashcard::create(&pool, id, "user-a", &card_data("old front", "old back"))
            .await
            .unwrap();

        let edit = UpdateFlashcard {
            front: "new front".to_string(),
            back: "new back".to_string(),
        };

        let denied = Flashcard::update(&pool, id, "user-b", &edit).await.unwrap();
        assert!(denied.is_none());

        let updated = Flashcard::update(&pool, id, "user-a", &edit)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.front, "new front");
        assert_eq!(updated.back, "new back");
    }

    #[tokio::test]
    async fn set_image_url_is_owner_scoped() {
        let pool = test_pool().await;
        let id = Uuid::new_v4();
        Flashcard::create(&pool, id, "user-a", &card_data("q", "a"))
            .await
            .unwrap();

        let denied = Flashcard::set_image_url(&pool, id, "user-b", "https://img/x.png")
            .await
            .unwrap();
        assert_eq!(denied, 0);

        let updated = Flashcard::set_image_url(&pool, id, "user-a", "https://img/x.png")
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let card = Flashcard::find_for_user(&pool, id, "user-a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(card.image_url.as_deref(), Some("https://img/x.png"));
    }

    #[tokio::test]
    async fn delete_is_owner_scoped() {
        let pool = test_pool().await;
        let id = Uuid::new_v4();
        Flashcard::create(&pool, id, "user-a", &card_data("q", "a"))
            .await
            .unwrap();

        assert_eq!(Flashcard::delete(&pool, id, "user-b").await.unwrap(), 0);
        assert_eq!(Flashcard::delete(&pool, id, "user-a").await.unwrap(), 1);
        assert!(
            Flashcard::find_for_user(&pool, id, "user-a")
                .await
                .unwrap()
                .is_none()
        );
    }
}
