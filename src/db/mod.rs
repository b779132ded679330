use crate::config::SecurityConfig;
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::account::Account;
pub use repositories::event::{Event, EventInput, EventPatch};
pub use repositories::gallery::GalleryImage;
pub use repositories::role_rank::RoleRank;
pub use repositories::roster::{RosterMember, RosterMemberInput};
pub use repositories::visibility::YearVisibilityRow;

/// Formats a timestamp the way every table stores it.
///
/// Fixed millisecond precision with a `Z` suffix keeps stored values
/// lexicographically ordered.
#[must_use]
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Extracts the message of a unique-constraint violation from a repository error.
#[must_use]
pub fn unique_violation(err: &anyhow::Error) -> Option<String> {
    match err.downcast_ref::<DbErr>()?.sql_err()? {
        SqlErr::UniqueConstraintViolation(msg) => Some(msg),
        _ => None,
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `sqlite::memory:` would otherwise see its own empty database.
        let (max_connections, min_connections) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn roster_repo(&self) -> repositories::roster::RosterRepository {
        repositories::roster::RosterRepository::new(self.conn.clone())
    }

    fn role_rank_repo(&self) -> repositories::role_rank::RoleRankRepository {
        repositories::role_rank::RoleRankRepository::new(self.conn.clone())
    }

    fn visibility_repo(&self) -> repositories::visibility::VisibilityRepository {
        repositories::visibility::VisibilityRepository::new(self.conn.clone())
    }

    fn event_repo(&self) -> repositories::event::EventRepository {
        repositories::event::EventRepository::new(self.conn.clone())
    }

    fn gallery_repo(&self) -> repositories::gallery::GalleryRepository {
        repositories::gallery::GalleryRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<Account> {
        self.account_repo()
            .create(username, email, password, config)
            .await
    }

    pub async fn get_account(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_email(email).await
    }

    pub async fn get_account_with_password(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<(Account, String)>> {
        self.account_repo()
            .get_by_identifier_with_password(username, email)
            .await
    }

    pub async fn update_account_password(
        &self,
        email: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        self.account_repo()
            .update_password(email, new_password, config)
            .await
    }

    pub async fn set_pending_reset(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.account_repo()
            .set_pending_reset(email, code, expires_at)
            .await
    }

    pub async fn clear_pending_reset(&self, email: &str) -> Result<()> {
        self.account_repo().clear_pending_reset(email).await
    }

    pub async fn clear_expired_pending_resets(&self, now: DateTime<Utc>) -> Result<u64> {
        self.account_repo().clear_expired_pending_resets(now).await
    }

    pub async fn pending_reset_expiry(&self, email: &str) -> Result<Option<String>> {
        self.account_repo().pending_reset_expiry(email).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list().await
    }

    pub async fn delete_account(&self, id: i32) -> Result<bool> {
        self.account_repo().delete(id).await
    }

    // ========================================================================
    // Roster
    // ========================================================================

    pub async fn add_roster_member(&self, input: RosterMemberInput) -> Result<RosterMember> {
        self.roster_repo().insert(input).await
    }

    pub async fn distinct_year_ranges(&self) -> Result<Vec<String>> {
        self.roster_repo().distinct_year_ranges().await
    }

    pub async fn list_roster_members(&self, year_range: &str) -> Result<Vec<RosterMember>> {
        self.roster_repo().list_by_year(year_range).await
    }

    pub async fn delete_roster_member(&self, id: i32) -> Result<bool> {
        self.roster_repo().delete(id).await
    }

    pub async fn add_role_rank(&self, role_name: &str, rank: i32) -> Result<RoleRank> {
        self.role_rank_repo().add(role_name, rank).await
    }

    pub async fn list_role_ranks(&self) -> Result<Vec<RoleRank>> {
        self.role_rank_repo().list().await
    }

    pub async fn role_rank_map(&self) -> Result<HashMap<String, i32>> {
        self.role_rank_repo().rank_map().await
    }

    pub async fn get_year_visibility(&self, year_range: &str) -> Result<Option<YearVisibilityRow>> {
        self.visibility_repo().get(year_range).await
    }

    pub async fn set_year_hidden(&self, year_range: &str, hidden: bool) -> Result<()> {
        self.visibility_repo().set_hidden(year_range, hidden).await
    }

    pub async fn hide_toggle_delete(&self, year_range: &str) -> Result<()> {
        self.visibility_repo().hide_toggle_delete(year_range).await
    }

    pub async fn list_hidden_years(&self) -> Result<Vec<YearVisibilityRow>> {
        self.visibility_repo().list_hidden().await
    }

    // ========================================================================
    // Events & gallery
    // ========================================================================

    pub async fn add_event(&self, input: EventInput) -> Result<Event> {
        self.event_repo().insert(input).await
    }

    pub async fn get_event(&self, id: i32) -> Result<Option<Event>> {
        self.event_repo().get(id).await
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        self.event_repo().list().await
    }

    pub async fn update_event(&self, id: i32, patch: EventPatch) -> Result<Option<Event>> {
        self.event_repo().update(id, patch).await
    }

    pub async fn delete_event(&self, id: i32) -> Result<bool> {
        self.event_repo().delete(id).await
    }

    pub async fn add_gallery_image(
        &self,
        url: &str,
        content_type: Option<&str>,
    ) -> Result<GalleryImage> {
        self.gallery_repo().insert(url, content_type).await
    }

    pub async fn list_gallery_images(&self) -> Result<Vec<GalleryImage>> {
        self.gallery_repo().list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    fn cheap() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    fn member(name: &str, role: &str, year: &str) -> RosterMemberInput {
        RosterMemberInput {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            role: role.to_string(),
            department: "CSE".to_string(),
            profile_link: "https://example.com".to_string(),
            image_url: "https://img.example.com/x.png".to_string(),
            year_range: year.to_string(),
        }
    }

    #[test]
    fn timestamps_sort_lexicographically() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::milliseconds(1500);
        assert!(timestamp(earlier) < timestamp(later));
        assert!(timestamp(earlier).ends_with('Z'));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = store().await;
        store
            .create_account("alice", "a@example.com", "secret1", &cheap())
            .await
            .unwrap();

        let err = store
            .create_account("alice2", "a@example.com", "secret1", &cheap())
            .await
            .unwrap_err();
        let msg = unique_violation(&err).expect("unique violation");
        assert!(msg.contains("email"));
    }

    #[tokio::test]
    async fn distinct_year_ranges_deduplicates() {
        let store = store().await;
        store
            .add_roster_member(member("a", "President", "2023-2024"))
            .await
            .unwrap();
        store
            .add_roster_member(member("b", "Member", "2023-2024"))
            .await
            .unwrap();
        store
            .add_roster_member(member("c", "Member", "2022-2023"))
            .await
            .unwrap();

        let mut ranges = store.distinct_year_ranges().await.unwrap();
        ranges.sort();
        assert_eq!(ranges, vec!["2022-2023", "2023-2024"]);
    }

    #[tokio::test]
    async fn visibility_upsert_keeps_toggle_flag() {
        let store = store().await;
        store.hide_toggle_delete("2021-2022").await.unwrap();
        store.set_year_hidden("2021-2022", false).await.unwrap();

        let row = store.get_year_visibility("2021-2022").await.unwrap().unwrap();
        assert!(!row.hidden);
        assert!(!row.show_toggle_delete);

        store.set_year_hidden("2020-2021", true).await.unwrap();
        store.set_year_hidden("2020-2021", true).await.unwrap();
        let hidden = store.list_hidden_years().await.unwrap();
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].year_range, "2020-2021");
        assert!(hidden[0].show_toggle_delete);
    }

    #[tokio::test]
    async fn expired_reset_markers_are_cleared() {
        let store = store().await;
        store
            .create_account("bob", "bob@example.com", "secret1", &cheap())
            .await
            .unwrap();
        let past = Utc::now() - chrono::Duration::minutes(5);
        assert!(
            store
                .set_pending_reset("bob@example.com", "123456", past)
                .await
                .unwrap()
        );

        let cleared = store.clear_expired_pending_resets(Utc::now()).await.unwrap();
        assert_eq!(cleared, 1);
        assert!(
            store
                .pending_reset_expiry("bob@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }
}
