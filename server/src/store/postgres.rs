use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    AttendeeRsvp, Event, EventInput, EventListing, NewProfile, NewUser, Review, ReviewWithAuthor,
    Rsvp, RsvpStatus, User, UserProfile, UserRsvp,
};

use super::{EventFilter, EventStore, StoreError, StoreResult};

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Removes every row from every table.
    pub async fn reset(&self) -> StoreResult<()> {
        sqlx::query("TRUNCATE reviews, rsvps, events, user_profiles, users")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message()),
        _ => StoreError::Database(err),
    }
}

fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Appends the visibility predicate for events aliased as `e`.
fn push_visibility(query: &mut QueryBuilder<'_, Postgres>, viewer: Option<Uuid>) {
    match viewer {
        Some(user_id) => {
            query
                .push("(e.is_public OR e.organizer_id = ")
                .push_bind(user_id)
                .push(" OR EXISTS (SELECT 1 FROM rsvps v WHERE v.event_id = e.id AND v.user_id = ")
                .push_bind(user_id)
                .push("))");
        }
        None => {
            query.push("e.is_public");
        }
    }
}

fn push_event_conditions(query: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    push_visibility(query, filter.viewer);

    if let Some(search) = filter.search.as_deref() {
        let pattern = like_pattern(search);
        query
            .push(" AND (e.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.location ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(location) = filter.location.as_deref() {
        query
            .push(" AND e.location ILIKE ")
            .push_bind(like_pattern(location));
    }
    if let Some(organizer) = filter.organizer {
        query.push(" AND e.organizer_id = ").push_bind(organizer);
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn create_user(&self, user: NewUser, profile: NewProfile) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("username '{}' is already taken", user.username)
            })
        })?;

        sqlx::query(
            "INSERT INTO user_profiles (user_id, full_name, bio, location, profile_picture) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(created.id)
        .bind(&profile.full_name)
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(&profile.profile_picture)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(profile)
    }

    async fn save_profile(&self, profile: UserProfile) -> StoreResult<UserProfile> {
        let saved = sqlx::query_as::<_, UserProfile>(
            "INSERT INTO user_profiles (user_id, full_name, bio, location, profile_picture) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 full_name = EXCLUDED.full_name, \
                 bio = EXCLUDED.bio, \
                 location = EXCLUDED.location, \
                 profile_picture = EXCLUDED.profile_picture, \
                 updated_at = NOW() \
             RETURNING *",
        )
        .bind(profile.user_id)
        .bind(&profile.full_name)
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(&profile.profile_picture)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn create_event(&self, organizer_id: Uuid, input: EventInput) -> StoreResult<Event> {
        let event = sqlx::query_as::<_, Event>(
            "INSERT INTO events \
                 (id, organizer_id, title, description, location, start_time, end_time, is_public) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(organizer_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.location)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.is_public)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn update_event(&self, id: Uuid, input: EventInput) -> StoreResult<Event> {
        sqlx::query_as::<_, Event>(
            "UPDATE events SET title = $2, description = $3, location = $4, \
                 start_time = $5, end_time = $6, is_public = $7, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.location)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.is_public)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::not_found("Event"))
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Event"));
        }
        Ok(())
    }

    async fn list_events(&self, filter: &EventFilter) -> StoreResult<(Vec<EventListing>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events e WHERE ");
        push_event_conditions(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT e.*, (SELECT COUNT(*) FROM rsvps r WHERE r.event_id = e.id) AS rsvp_count \
             FROM events e WHERE ",
        );
        push_event_conditions(&mut query, filter);
        query.push(" ORDER BY e.start_time, e.id");
        if filter.limit > 0 {
            query.push(" LIMIT ").push_bind(i64::from(filter.limit));
        }
        query.push(" OFFSET ").push_bind(i64::from(filter.offset));

        let events = query
            .build_query_as::<EventListing>()
            .fetch_all(&self.pool)
            .await?;
        Ok((events, total.max(0) as u64))
    }

    async fn count_rsvps(&self, event_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rsvps WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_organizers(&self, viewer: Option<Uuid>) -> StoreResult<Vec<User>> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT DISTINCT u.* FROM users u JOIN events e ON e.organizer_id = u.id WHERE ",
        );
        push_visibility(&mut query, viewer);
        query.push(" ORDER BY u.username");

        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn list_organized_events(&self, organizer_id: Uuid) -> StoreResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE organizer_id = $1 ORDER BY created_at DESC",
        )
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn events_needing_reminder(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events \
             WHERE reminder_sent_at IS NULL AND start_time > $1 AND start_time <= $2 \
             ORDER BY start_time",
        )
        .bind(now)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn mark_reminder_sent(&self, event_id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        let result = sqlx::query("UPDATE events SET reminder_sent_at = $2 WHERE id = $1")
            .bind(event_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Event"));
        }
        Ok(())
    }

    async fn find_rsvp(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Rsvp>> {
        let rsvp =
            sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE event_id = $1 AND user_id = $2")
                .bind(event_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(rsvp)
    }

    async fn get_rsvp(&self, id: Uuid) -> StoreResult<Option<Rsvp>> {
        let rsvp = sqlx::query_as::<_, Rsvp>("SELECT * FROM rsvps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rsvp)
    }

    async fn upsert_rsvp(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: RsvpStatus,
    ) -> StoreResult<Rsvp> {
        let rsvp = sqlx::query_as::<_, Rsvp>(
            "INSERT INTO rsvps (id, event_id, user_id, status) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (event_id, user_id) DO UPDATE SET \
                 status = EXCLUDED.status, \
                 updated_at = CASE WHEN rsvps.status = EXCLUDED.status \
                     THEN rsvps.updated_at ELSE NOW() END \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(user_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(rsvp)
    }

    async fn update_rsvp_status(&self, id: Uuid, status: RsvpStatus) -> StoreResult<Rsvp> {
        sqlx::query_as::<_, Rsvp>(
            "UPDATE rsvps SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::not_found("RSVP"))
    }

    async fn delete_rsvp(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM rsvps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("RSVP"));
        }
        Ok(())
    }

    async fn list_event_rsvps(&self, event_id: Uuid) -> StoreResult<Vec<AttendeeRsvp>> {
        let rsvps = sqlx::query_as::<_, AttendeeRsvp>(
            "SELECT r.*, u.username FROM rsvps r JOIN users u ON u.id = r.user_id \
             WHERE r.event_id = $1 ORDER BY r.created_at",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rsvps)
    }

    async fn list_user_rsvps(&self, user_id: Uuid) -> StoreResult<Vec<UserRsvp>> {
        let rsvps = sqlx::query_as::<_, UserRsvp>(
            "SELECT r.*, e.title AS event_title, e.start_time AS event_start_time \
             FROM rsvps r JOIN events e ON e.id = r.event_id \
             WHERE r.user_id = $1 ORDER BY r.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rsvps)
    }

    async fn attendee_emails(
        &self,
        event_id: Uuid,
        status: Option<RsvpStatus>,
    ) -> StoreResult<Vec<String>> {
        let emails = sqlx::query_scalar::<_, String>(
            "SELECT u.email FROM rsvps r JOIN users u ON u.id = r.user_id \
             WHERE r.event_id = $1 AND ($2::text IS NULL OR r.status = $2) \
             ORDER BY r.created_at",
        )
        .bind(event_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }

    async fn past_attendee_emails(&self, organizer_id: Uuid) -> StoreResult<Vec<String>> {
        let emails = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT u.email FROM rsvps r \
             JOIN events e ON e.id = r.event_id \
             JOIN users u ON u.id = r.user_id \
             WHERE e.organizer_id = $1 AND r.status = $2 \
             ORDER BY u.email",
        )
        .bind(organizer_id)
        .bind(RsvpStatus::Going.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }

    async fn create_review(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        rating: i16,
        comment: String,
    ) -> StoreResult<Review> {
        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (id, event_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await?;
        Ok(review)
    }

    async fn get_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn update_review(&self, id: Uuid, rating: i16, comment: String) -> StoreResult<Review> {
        sqlx::query_as::<_, Review>(
            "UPDATE reviews SET rating = $2, comment = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(rating)
        .bind(comment)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::not_found("Review"))
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Review"));
        }
        Ok(())
    }

    async fn list_event_reviews(&self, event_id: Uuid) -> StoreResult<Vec<ReviewWithAuthor>> {
        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            "SELECT r.*, u.username FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.event_id = $1 ORDER BY r.created_at DESC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn list_user_reviews(&self, user_id: Uuid) -> StoreResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("tech"), "%tech%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
