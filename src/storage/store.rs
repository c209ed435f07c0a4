//! Record store abstraction and its JSONL implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{EntityType, JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::models::{
    AchievementId, Category, ChallengeId, CustomChallenge, Review, TypingResult,
    UnlockedAchievement, User, UserId,
};

/// Queryable record store behind the scoring core.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a user. Names are unique case-insensitively.
    async fn insert_user(&self, user: User) -> Result<User, StorageError>;

    async fn list_users(&self) -> Result<Vec<User>, StorageError>;

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StorageError>;

    /// Case-insensitive exact match on the display name.
    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, StorageError>;

    /// Remove a user with all their results and unlocks. Returns false if
    /// the user did not exist.
    async fn delete_user(&self, id: &UserId) -> Result<bool, StorageError>;

    async fn append_result(&self, result: &TypingResult) -> Result<(), StorageError>;

    async fn results_for_user(&self, user: &UserId) -> Result<Vec<TypingResult>, StorageError>;

    /// Results created at or after `since`, optionally of one category.
    async fn results_since(
        &self,
        since: DateTime<Utc>,
        category: Option<Category>,
    ) -> Result<Vec<TypingResult>, StorageError>;

    async fn unlocked_achievements(
        &self,
        user: &UserId,
    ) -> Result<Vec<UnlockedAchievement>, StorageError>;

    /// Record unlocks for `user`, skipping ids already unlocked. Atomic with
    /// respect to concurrent callers. Returns only the newly inserted unlocks.
    async fn unlock_achievements(
        &self,
        user: &UserId,
        ids: &[AchievementId],
        at: DateTime<Utc>,
    ) -> Result<Vec<UnlockedAchievement>, StorageError>;

    async fn insert_custom_challenge(&self, challenge: &CustomChallenge)
        -> Result<(), StorageError>;

    /// Newest first, at most `limit`.
    async fn list_custom_challenges(
        &self,
        limit: usize,
    ) -> Result<Vec<CustomChallenge>, StorageError>;

    /// Fetch a custom challenge for play, incrementing its play count.
    async fn fetch_custom_challenge_for_play(
        &self,
        id: &ChallengeId,
    ) -> Result<Option<CustomChallenge>, StorageError>;

    /// Attach a review. `NotFound` for an unknown challenge, `Conflict` if the
    /// reviewer already reviewed it.
    async fn add_review(
        &self,
        id: &ChallengeId,
        review: Review,
    ) -> Result<CustomChallenge, StorageError>;
}

/// [`RecordStore`] over JSONL files. A single mutex serializes every
/// read-modify-write so concurrent requests cannot lose updates.
pub struct JsonlStore {
    config: StorageConfig,
    lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn reader<T: serde::de::DeserializeOwned>(&self, entity: EntityType) -> JsonlReader<T> {
        JsonlReader::for_entity(&self.config, entity)
    }

    fn writer<T: serde::Serialize>(&self, entity: EntityType) -> JsonlWriter<T> {
        JsonlWriter::for_entity(&self.config, entity)
    }
}

#[async_trait]
impl RecordStore for JsonlStore {
    async fn insert_user(&self, user: User) -> Result<User, StorageError> {
        let _guard = self.lock.lock().await;
        let users: Vec<User> = self.reader(EntityType::User).read_all()?;
        if users.iter().any(|u| u.name_matches(&user.name)) {
            return Err(StorageError::Conflict(format!(
                "Username {} is already taken",
                user.name
            )));
        }
        self.writer(EntityType::User).append(&user)?;
        info!(user = %user.id, name = %user.name, "Created user");
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let _guard = self.lock.lock().await;
        self.reader(EntityType::User).read_all()
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        let _guard = self.lock.lock().await;
        let users: Vec<User> = self.reader(EntityType::User).read_where(|u: &User| &u.id == id)?;
        Ok(users.into_iter().next())
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, StorageError> {
        let _guard = self.lock.lock().await;
        let users: Vec<User> = self
            .reader(EntityType::User)
            .read_where(|u: &User| u.name_matches(name))?;
        Ok(users.into_iter().next())
    }

    async fn delete_user(&self, id: &UserId) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;

        let users: Vec<User> = self.reader(EntityType::User).read_all()?;
        let before = users.len();
        let users: Vec<User> = users.into_iter().filter(|u| &u.id != id).collect();
        if users.len() == before {
            return Ok(false);
        }

        let results: Vec<TypingResult> = self
            .reader(EntityType::Result)
            .read_where(|r: &TypingResult| &r.user != id)?;
        let unlocks: Vec<UnlockedAchievement> = self
            .reader(EntityType::UnlockedAchievement)
            .read_where(|u: &UnlockedAchievement| &u.user != id)?;

        self.writer(EntityType::Result).write_all(&results)?;
        self.writer(EntityType::UnlockedAchievement)
            .write_all(&unlocks)?;
        self.writer(EntityType::User).write_all(&users)?;

        info!(user = %id, "Deleted user and their records");
        Ok(true)
    }

    async fn append_result(&self, result: &TypingResult) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        self.writer(EntityType::Result).append(result)?;
        debug!(user = %result.user, category = %result.category, wpm = result.wpm(), "Saved result");
        Ok(())
    }

    async fn results_for_user(&self, user: &UserId) -> Result<Vec<TypingResult>, StorageError> {
        let _guard = self.lock.lock().await;
        self.reader(EntityType::Result)
            .read_where(|r: &TypingResult| &r.user == user)
    }

    async fn results_since(
        &self,
        since: DateTime<Utc>,
        category: Option<Category>,
    ) -> Result<Vec<TypingResult>, StorageError> {
        let _guard = self.lock.lock().await;
        self.reader(EntityType::Result)
            .read_where(|r: &TypingResult| {
                r.created_at >= since && category.map_or(true, |c| r.category == c)
            })
    }

    async fn unlocked_achievements(
        &self,
        user: &UserId,
    ) -> Result<Vec<UnlockedAchievement>, StorageError> {
        let _guard = self.lock.lock().await;
        self.reader(EntityType::UnlockedAchievement)
            .read_where(|u: &UnlockedAchievement| &u.user == user)
    }

    async fn unlock_achievements(
        &self,
        user: &UserId,
        ids: &[AchievementId],
        at: DateTime<Utc>,
    ) -> Result<Vec<UnlockedAchievement>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let _guard = self.lock.lock().await;

        let existing: Vec<UnlockedAchievement> = self
            .reader(EntityType::UnlockedAchievement)
            .read_where(|u: &UnlockedAchievement| &u.user == user)?;

        let mut fresh: Vec<UnlockedAchievement> = Vec::new();
        for id in ids {
            let known = existing.iter().any(|u| u.achievement_id == *id)
                || fresh.iter().any(|u| u.achievement_id == *id);
            if !known {
                fresh.push(UnlockedAchievement {
                    user: user.clone(),
                    achievement_id: *id,
                    unlocked_at: at,
                });
            }
        }

        self.writer(EntityType::UnlockedAchievement)
            .append_batch(&fresh)?;
        if !fresh.is_empty() {
            info!(user = %user, count = fresh.len(), "Unlocked achievements");
        }
        Ok(fresh)
    }

    async fn insert_custom_challenge(
        &self,
        challenge: &CustomChallenge,
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        self.writer(EntityType::CustomChallenge).append(challenge)?;
        info!(challenge = %challenge.id, creator = %challenge.creator, "Created custom challenge");
        Ok(())
    }

    async fn list_custom_challenges(
        &self,
        limit: usize,
    ) -> Result<Vec<CustomChallenge>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut challenges: Vec<CustomChallenge> =
            self.reader(EntityType::CustomChallenge).read_all()?;
        challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        challenges.truncate(limit);
        Ok(challenges)
    }

    async fn fetch_custom_challenge_for_play(
        &self,
        id: &ChallengeId,
    ) -> Result<Option<CustomChallenge>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut challenges: Vec<CustomChallenge> =
            self.reader(EntityType::CustomChallenge).read_all()?;

        let Some(challenge) = challenges.iter_mut().find(|c| &c.id == id) else {
            return Ok(None);
        };
        challenge.play_count += 1;
        let fetched = challenge.clone();

        self.writer(EntityType::CustomChallenge)
            .write_all(&challenges)?;
        Ok(Some(fetched))
    }

    async fn add_review(
        &self,
        id: &ChallengeId,
        review: Review,
    ) -> Result<CustomChallenge, StorageError> {
        let _guard = self.lock.lock().await;
        let mut challenges: Vec<CustomChallenge> =
            self.reader(EntityType::CustomChallenge).read_all()?;

        let challenge = challenges
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("Challenge {}", id)))?;
        challenge
            .add_review(review)
            .map_err(|e| StorageError::Conflict(e.to_string()))?;
        let updated = challenge.clone();

        self.writer(EntityType::CustomChallenge)
            .write_all(&challenges)?;
        Ok(updated)
    }
}
