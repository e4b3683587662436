use sqlx::{Sqlite, SqlitePool};

use crate::{
    data_formats::Page,
    errors::RequestError,
    models::{Profile, RecipeShort},
};

const PROFILE_QUERY: &str = r#"
    SELECT users.id                                         AS "id",
           users.email                                      AS "email",
           users.username                                   AS "username",
           users.first_name                                 AS "first_name",
           users.last_name                                  AS "last_name",
           EXISTS (SELECT 1
                   FROM   follows
                   WHERE  follows.author_id = users.id
                      AND follows.follower_id = ?1)         AS "is_subscribed"
    FROM   users
"#;

pub async fn get_profile_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    profile_id: i64,
) -> Result<Profile, RequestError> {
    let query = format!("{PROFILE_QUERY} WHERE users.id = ?2");
    sqlx::query_as::<Sqlite, Profile>(&query)
        .bind(viewer)
        .bind(profile_id)
        .fetch_optional(pool)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}

pub async fn list_profiles_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    page: Page,
) -> Result<(Vec<Profile>, i64), RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{PROFILE_QUERY} ORDER BY users.username LIMIT ?2 OFFSET ?3");
    let profiles = sqlx::query_as::<Sqlite, Profile>(&query)
        .bind(viewer)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&mut *tx)
        .await?;
    let count = sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok((profiles, count))
}

// ----------------- Follow Functions -----------------

/// Subscribes `follower_id` to `author_id` and returns the author as now
/// seen by the follower.
pub async fn follow_user_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    author_id: i64,
) -> Result<Profile, RequestError> {
    if follower_id == author_id {
        return Err(RequestError::validation("You can't subscribe to yourself"));
    }
    let mut tx = pool.begin().await?;
    let author_exists =
        sqlx::query_scalar::<Sqlite, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = ?1)")
            .bind(author_id)
            .fetch_one(&mut *tx)
            .await?;
    if !author_exists {
        return Err(RequestError::NotFound("User not found"));
    }
    let already_following = sqlx::query_scalar::<Sqlite, bool>(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = ?1 AND author_id = ?2)",
    )
    .bind(follower_id)
    .bind(author_id)
    .fetch_one(&mut *tx)
    .await?;
    if already_following {
        return Err(RequestError::validation(
            "You are already subscribed to this user",
        ));
    }

    sqlx::query("INSERT INTO follows (follower_id, author_id) VALUES (?1, ?2)")
        .bind(follower_id)
        .bind(author_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            RequestError::from(e).on_unique_violation("You are already subscribed to this user")
        })?;
    tx.commit().await?;

    get_profile_in_db(pool, Some(follower_id), author_id).await
}

pub async fn unfollow_user_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    author_id: i64,
) -> Result<(), RequestError> {
    if follower_id == author_id {
        return Err(RequestError::validation(
            "You can't unsubscribe from yourself",
        ));
    }
    let mut tx = pool.begin().await?;
    let author_exists =
        sqlx::query_scalar::<Sqlite, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = ?1)")
            .bind(author_id)
            .fetch_one(&mut *tx)
            .await?;
    if !author_exists {
        return Err(RequestError::NotFound("User not found"));
    }

    let result = sqlx::query("DELETE FROM follows WHERE follower_id = ?1 AND author_id = ?2")
        .bind(follower_id)
        .bind(author_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::validation(
            "You are not subscribed to this user",
        ));
    }
    tx.commit().await?;
    Ok(())
}

/// Authors followed by `follower_id`, ordered by username.
pub async fn list_subscriptions_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    page: Page,
) -> Result<(Vec<Profile>, i64), RequestError> {
    let mut tx = pool.begin().await?;
    let authors = sqlx::query_as::<Sqlite, Profile>(
        r#"
        SELECT users.id, users.email, users.username, users.first_name, users.last_name,
               1 AS "is_subscribed"
        FROM   users
               JOIN follows
                 ON follows.author_id = users.id
        WHERE  follows.follower_id = ?1
        ORDER  BY users.username
        LIMIT  ?2 OFFSET ?3
        "#,
    )
    .bind(follower_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(&mut *tx)
    .await?;
    let count =
        sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = ?1")
            .bind(follower_id)
            .fetch_one(&mut *tx)
            .await?;
    tx.commit().await?;
    Ok((authors, count))
}

/// The author's newest recipes, up to `limit`, and their total recipe count.
pub async fn get_author_recipes_preview_in_db(
    pool: &SqlitePool,
    author_id: i64,
    limit: u32,
) -> Result<(Vec<RecipeShort>, i64), RequestError> {
    let mut tx = pool.begin().await?;
    let recipes = sqlx::query_as::<Sqlite, RecipeShort>(
        r#"
        SELECT id, name, image, cooking_time
        FROM   recipes
        WHERE  author_id = ?1
        ORDER  BY pub_date DESC, id DESC
        LIMIT  ?2
        "#,
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(&mut *tx)
    .await?;
    let count =
        sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM recipes WHERE author_id = ?1")
            .bind(author_id)
            .fetch_one(&mut *tx)
            .await?;
    tx.commit().await?;
    Ok((recipes, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::test_utils::*;

    fn first_page() -> Page {
        Page {
            page: 1,
            limit: 10,
            offset: 0,
        }
    }

    #[tokio::test]
    async fn follow_then_duplicate_follow_fails() {
        let pool = setup_test_db().await;
        let reader = create_user(&pool, "reader").await;
        let author = create_user(&pool, "author").await;

        let profile = follow_user_in_db(&pool, reader.id, author.id).await.unwrap();
        assert!(profile.is_subscribed);

        let error = follow_user_in_db(&pool, reader.id, author.id)
            .await
            .unwrap_err();
        assert!(matches!(error, RequestError::Validation(_)));

        let (authors, count) = list_subscriptions_in_db(&pool, reader.id, first_page())
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(authors[0].id, author.id);
    }

    #[tokio::test]
    async fn self_follow_always_fails() {
        let pool = setup_test_db().await;
        let user = create_user(&pool, "loner").await;
        assert!(matches!(
            follow_user_in_db(&pool, user.id, user.id).await,
            Err(RequestError::Validation(_))
        ));
        assert!(matches!(
            unfollow_user_in_db(&pool, user.id, user.id).await,
            Err(RequestError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn unfollow_without_follow_fails_and_unknown_author_is_not_found() {
        let pool = setup_test_db().await;
        let reader = create_user(&pool, "reader").await;
        let author = create_user(&pool, "author").await;

        assert!(matches!(
            unfollow_user_in_db(&pool, reader.id, author.id).await,
            Err(RequestError::Validation(_))
        ));
        assert!(matches!(
            follow_user_in_db(&pool, reader.id, author.id + 100).await,
            Err(RequestError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn anonymous_viewer_is_never_subscribed() {
        let pool = setup_test_db().await;
        let reader = create_user(&pool, "reader").await;
        let author = create_user(&pool, "author").await;
        follow_user_in_db(&pool, reader.id, author.id).await.unwrap();

        let profile = get_profile_in_db(&pool, None, author.id).await.unwrap();
        assert!(!profile.is_subscribed);
        let profile = get_profile_in_db(&pool, Some(reader.id), author.id)
            .await
            .unwrap();
        assert!(profile.is_subscribed);
    }

    #[tokio::test]
    async fn recipes_preview_respects_limit_but_counts_all() {
        let pool = setup_test_db().await;
        let author = create_user(&pool, "author").await;
        let tag = create_tag(&pool, "dinner", "#8775D2").await;
        let flour = create_ingredient(&pool, "flour", "g").await;
        for name in ["one", "two", "three", "four"] {
            create_recipe(&pool, &author, name, vec![tag.id], &[(flour.id, 100)]).await;
        }

        let (recipes, count) = get_author_recipes_preview_in_db(&pool, author.id, 3)
            .await
            .unwrap();
        assert_eq!(recipes.len(), 3);
        assert_eq!(count, 4);
        assert_eq!(recipes[0].name, "four");
    }
}
