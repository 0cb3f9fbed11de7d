use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::*;

pub struct UserQueries;

impl UserQueries {
    pub async fn create_user(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
        name: &str,
        role: Role,
        quota_reset_date: DateTime<Utc>,
        next_quota_reset: DateTime<Utc>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, role, request_quota, used_quota, quota_reset_date, next_quota_reset)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(role)
        .bind(role.request_allowance())
        .bind(quota_reset_date)
        .bind(next_quota_reset)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn list(pool: &PgPool, query: &UserListQuery) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.role)
        .bind(query.search.as_ref().map(|s| format!("%{}%", s)))
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn email_taken_by_other(pool: &PgPool, email: &str, id: Uuid) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id != $2)",
        )
        .bind(email)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    pub async fn update_user(pool: &PgPool, id: Uuid, update: &UpdateUserRequest) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                request_quota = COALESCE($5, request_quota),
                used_quota = COALESCE($6, used_quota),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.email.as_deref())
        .bind(update.role)
        .bind(update.request_quota)
        .bind(update.used_quota)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Zero the monthly counter and stamp the new window, but only if the
    /// stored window is still behind `$2` so concurrent logins apply the
    /// rollover once.
    pub async fn apply_quota_reset(
        pool: &PgPool,
        id: Uuid,
        normalized_last_reset: DateTime<Utc>,
        next_reset: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                used_quota = 0,
                quota_reset_date = $2,
                next_quota_reset = $3,
                updated_at = NOW()
            WHERE id = $1 AND (quota_reset_date IS NULL OR quota_reset_date < $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(normalized_last_reset)
        .bind(next_reset)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn refresh_next_reset(
        pool: &PgPool,
        id: Uuid,
        next_reset: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET next_quota_reset = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(next_reset)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Conditional increment bounded by the quota ceiling; zero rows affected
    /// means the caller lost the admission check.
    pub async fn consume_quota(conn: &mut PgConnection, id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users SET used_quota = used_quota + 1, updated_at = NOW()
            WHERE id = $1 AND used_quota < request_quota
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn upgrade_role(
        conn: &mut PgConnection,
        id: Uuid,
        role: Role,
        request_quota: i32,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET role = $2, request_quota = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(role)
        .bind(request_quota)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn find_by_id_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(user)
    }

    pub async fn claimed_prompt_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT prompt_id FROM user_claimed_prompts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    pub async fn favorite_prompt_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT prompt_id FROM user_favorite_prompts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }
}

pub struct PromptQueries;

impl PromptQueries {
    pub async fn create_prompt(
        conn: &mut PgConnection,
        request: &CreatePromptRequest,
        created_by: Uuid,
        redeem_code: Option<&str>,
    ) -> Result<Prompt> {
        let prompt = sqlx::query_as::<_, Prompt>(
            r#"
            INSERT INTO prompts (title, description, content, type, category, tags, created_by, is_active, redeem_code, lynk_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.content)
        .bind(request.prompt_type)
        .bind(&request.category)
        .bind(&request.tags)
        .bind(created_by)
        .bind(request.is_active)
        .bind(redeem_code)
        .bind(request.lynk_url.as_deref())
        .fetch_one(conn)
        .await?;

        Ok(prompt)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Prompt>> {
        let prompt = sqlx::query_as::<_, Prompt>("SELECT * FROM prompts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(prompt)
    }

    pub async fn list(
        pool: &PgPool,
        query: &PromptListQuery,
        include_inactive: bool,
    ) -> Result<Vec<Prompt>> {
        let prompts = sqlx::query_as::<_, Prompt>(
            r#"
            SELECT * FROM prompts
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::prompt_type IS NULL OR type = $2)
              AND ($3::text IS NULL OR title ILIKE $3 OR description ILIKE $3)
              AND (is_active OR $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.category.as_deref())
        .bind(query.prompt_type)
        .bind(query.search.as_ref().map(|s| format!("%{}%", s)))
        .bind(include_inactive)
        .fetch_all(pool)
        .await?;

        Ok(prompts)
    }

    pub async fn update_prompt(
        pool: &PgPool,
        id: Uuid,
        update: &UpdatePromptRequest,
    ) -> Result<Option<Prompt>> {
        let prompt = sqlx::query_as::<_, Prompt>(
            r#"
            UPDATE prompts SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                content = COALESCE($4, content),
                category = COALESCE($5, category),
                tags = COALESCE($6, tags),
                is_active = COALESCE($7, is_active),
                lynk_url = COALESCE($8, lynk_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.content.as_deref())
        .bind(update.category.as_deref())
        .bind(update.tags.as_deref())
        .bind(update.is_active)
        .bind(update.lynk_url.as_deref())
        .fetch_optional(pool)
        .await?;

        Ok(prompt)
    }

    pub async fn delete_prompt(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn title_of(conn: &mut PgConnection, id: Uuid) -> Result<Option<String>> {
        let title = sqlx::query_scalar::<_, String>("SELECT title FROM prompts WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(title)
    }
}

pub struct RedeemCodeQueries;

impl RedeemCodeQueries {
    pub async fn create_code(
        conn: &mut PgConnection,
        code: &str,
        kind: CodeKind,
        target_prompt_id: Option<Uuid>,
        target_role: Option<Role>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<RedeemCode> {
        let row = sqlx::query_as::<_, RedeemCode>(
            r#"
            INSERT INTO redeem_codes (code, kind, target_prompt_id, target_role, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(kind)
        .bind(target_prompt_id)
        .bind(target_role)
        .bind(expires_at)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn code_exists(pool: &PgPool, code: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM redeem_codes WHERE code = $1)",
        )
        .bind(code)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Row-locked lookup of an unused code; concurrent claimers serialize
    /// here and the loser sees no row.
    pub async fn find_unused_for_update(
        conn: &mut PgConnection,
        code: &str,
    ) -> Result<Option<RedeemCode>> {
        let row = sqlx::query_as::<_, RedeemCode>(
            "SELECT * FROM redeem_codes WHERE code = $1 AND is_used = FALSE FOR UPDATE",
        )
        .bind(code)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }

    /// `unused -> used`, guarded so the transition happens at most once.
    pub async fn mark_used_if_unused(
        conn: &mut PgConnection,
        id: Uuid,
        used_by: Uuid,
        used_at: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE redeem_codes SET is_used = TRUE, used_by = $2, used_at = $3
            WHERE id = $1 AND is_used = FALSE
            "#,
        )
        .bind(id)
        .bind(used_by)
        .bind(used_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn has_claimed(conn: &mut PgConnection, user_id: Uuid, prompt_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM user_claimed_prompts WHERE user_id = $1 AND prompt_id = $2)",
        )
        .bind(user_id)
        .bind(prompt_id)
        .fetch_one(conn)
        .await?;

        Ok(exists)
    }

    pub async fn add_claimed(conn: &mut PgConnection, user_id: Uuid, prompt_id: Uuid) -> Result<()> {
        sqlx::query("INSERT INTO user_claimed_prompts (user_id, prompt_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(prompt_id)
            .execute(conn)
            .await?;

        Ok(())
    }
}

pub struct FavoriteQueries;

impl FavoriteQueries {
    pub async fn is_favorite(pool: &PgPool, user_id: Uuid, prompt_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM user_favorite_prompts WHERE user_id = $1 AND prompt_id = $2)",
        )
        .bind(user_id)
        .bind(prompt_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    pub async fn add(pool: &PgPool, user_id: Uuid, prompt_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_favorite_prompts (user_id, prompt_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(prompt_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn remove(pool: &PgPool, user_id: Uuid, prompt_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM user_favorite_prompts WHERE user_id = $1 AND prompt_id = $2")
            .bind(user_id)
            .bind(prompt_id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

pub struct RequestQueries;

impl RequestQueries {
    pub async fn insert_request(
        conn: &mut PgConnection,
        request: &CreateRequestRequest,
    ) -> Result<PromptRequest> {
        let row = sqlx::query_as::<_, PromptRequest>(
            r#"
            INSERT INTO prompt_requests (user_id, title, description, category, priority)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.category)
        .bind(request.priority)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn list(pool: &PgPool, query: &RequestListQuery) -> Result<Vec<PromptRequestDetail>> {
        let rows = sqlx::query_as::<_, PromptRequestDetail>(
            r#"
            SELECT pr.id, pr.user_id, u.name AS user_name, pr.title, pr.description,
                   pr.category, pr.priority, pr.status, pr.admin_notes, pr.created_at, pr.updated_at
            FROM prompt_requests pr
            LEFT JOIN users u ON pr.user_id = u.id
            WHERE ($1::uuid IS NULL OR pr.user_id = $1)
              AND ($2::request_status IS NULL OR pr.status = $2)
            ORDER BY pr.created_at DESC
            "#,
        )
        .bind(query.user_id)
        .bind(query.status)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_detail_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PromptRequestDetail>> {
        let row = sqlx::query_as::<_, PromptRequestDetail>(
            r#"
            SELECT pr.id, pr.user_id, u.name AS user_name, pr.title, pr.description,
                   pr.category, pr.priority, pr.status, pr.admin_notes, pr.created_at, pr.updated_at
            FROM prompt_requests pr
            LEFT JOIN users u ON pr.user_id = u.id
            WHERE pr.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: RequestStatus,
        admin_notes: Option<&str>,
    ) -> Result<Option<PromptRequest>> {
        let row = sqlx::query_as::<_, PromptRequest>(
            r#"
            UPDATE prompt_requests SET status = $2, admin_notes = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(admin_notes)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }
}

pub struct StatsQueries;

impl StatsQueries {
    pub async fn count_users(pool: &PgPool) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?)
    }

    pub async fn count_active_prompts(pool: &PgPool) -> Result<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM prompts WHERE is_active = TRUE")
                .fetch_one(pool)
                .await?,
        )
    }

    pub async fn count_requests(pool: &PgPool) -> Result<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM prompt_requests")
                .fetch_one(pool)
                .await?,
        )
    }

    pub async fn count_pending_requests(pool: &PgPool) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM prompt_requests WHERE status = 'pending'",
        )
        .fetch_one(pool)
        .await?)
    }

    pub async fn prompt_type_counts(pool: &PgPool) -> Result<Vec<(PromptType, i64)>> {
        Ok(sqlx::query_as::<_, (PromptType, i64)>(
            "SELECT type, COUNT(*) FROM prompts WHERE is_active = TRUE GROUP BY type",
        )
        .fetch_all(pool)
        .await?)
    }

    pub async fn user_role_counts(pool: &PgPool) -> Result<Vec<(Role, i64)>> {
        Ok(
            sqlx::query_as::<_, (Role, i64)>("SELECT role, COUNT(*) FROM users GROUP BY role")
                .fetch_all(pool)
                .await?,
        )
    }
}
