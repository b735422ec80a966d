use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::core::ports::DocumentStore;
use crate::models::StudentProfile;

/// Key-value slot the profile is persisted under
pub const PROFILE_SLOT: &str = "UserProfileKey";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Local key-value storage for student profiles.
///
/// Each user has one slot, a JSON file in `dir` named after [`PROFILE_SLOT`]
/// and the url-encoded user id. The whole profile is rewritten on save.
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, user_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{}.json", PROFILE_SLOT, urlencoding::encode(user_id)))
    }

    /// Stored profile for `user_id`, or the default one if nothing usable is stored
    pub async fn load(&self, user_id: &str) -> StudentProfile {
        let path = self.slot_path(user_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return StudentProfile::default();
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                return StudentProfile::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Stored profile of {} is unreadable, using default: {}", user_id, e);
                StudentProfile::default()
            }
        }
    }

    pub async fn save(&self, user_id: &str, profile: &StudentProfile) -> Result<(), ProfileError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec(profile)?;
        tokio::fs::write(self.slot_path(user_id), bytes).await?;
        Ok(())
    }
}

/// Profile editor backing: each user's current profile in memory, persisted on
/// every change and mirrored to `users/{userId}`.
pub struct ProfileService {
    local: ProfileStore,
    remote: Arc<dyn DocumentStore>,
    current: Mutex<HashMap<String, StudentProfile>>,
}

impl ProfileService {
    pub fn new(local: ProfileStore, remote: Arc<dyn DocumentStore>) -> Self {
        Self {
            local,
            remote,
            current: Mutex::new(HashMap::new()),
        }
    }

    /// Current profile of `user_id`, read from local storage on first access
    pub async fn current(&self, user_id: &str) -> StudentProfile {
        let mut current = self.current.lock().await;
        if let Some(profile) = current.get(user_id) {
            return profile.clone();
        }
        let profile = self.local.load(user_id).await;
        current.insert(user_id.to_string(), profile.clone());
        profile
    }

    /// Replace the profile of `user_id`. Local persistence must succeed; the
    /// remote mirror is best effort.
    pub async fn update(
        &self,
        user_id: &str,
        profile: StudentProfile,
    ) -> Result<StudentProfile, ProfileError> {
        let profile = profile.normalized();

        self.local.save(user_id, &profile).await?;
        self.current
            .lock()
            .await
            .insert(user_id.to_string(), profile.clone());

        if let Err(e) = self.remote.save_profile(user_id, &profile).await {
            tracing::warn!("Failed to mirror profile for {}: {}", user_id, e);
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use crate::services::memory::MemoryStore;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("campus-swipe-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_slot_gives_default() {
        let store = ProfileStore::new(scratch_dir());
        assert_eq!(store.load("u1").await, StudentProfile::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = scratch_dir();
        let store = ProfileStore::new(&dir);

        let mut profile = StudentProfile::default();
        profile.name = "Ada".to_string();
        profile.image_data = Some(vec![137, 80, 78, 71]);
        store.save("u1", &profile).await.unwrap();

        assert_eq!(store.load("u1").await, profile);
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_corrupt_slot_falls_back_to_default() {
        let dir = scratch_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("UserProfileKey-u1.json"), b"{not json")
            .await
            .unwrap();

        let store = ProfileStore::new(&dir);
        assert_eq!(store.load("u1").await, StudentProfile::default());
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_user_id_cannot_escape_dir() {
        let dir = scratch_dir();
        let store = ProfileStore::new(&dir);
        store.save("../../etc/x", &StudentProfile::default()).await.unwrap();

        let path = store.slot_path("../../etc/x");
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert!(tokio::fs::metadata(&path).await.is_ok());
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_profiles_are_kept_per_user() {
        let dir = scratch_dir();
        let remote = Arc::new(MemoryStore::new());
        let service = ProfileService::new(ProfileStore::new(&dir), remote);

        let mut ada = StudentProfile::default();
        ada.name = "Ada".to_string();
        ada.grade = 12;
        service.update("ada", ada).await.unwrap();

        let mut bo = StudentProfile::default();
        bo.name = "Bo".to_string();
        bo.grade = 9;
        service.update("bo", bo).await.unwrap();

        assert_eq!(service.current("ada").await.name, "Ada");
        assert_eq!(service.current("bo").await.grade, 9);
        assert_eq!(service.current("carol").await, StudentProfile::default());

        // A fresh service reads each user's own slot back from disk
        let reloaded = ProfileService::new(ProfileStore::new(&dir), Arc::new(MemoryStore::new()));
        assert_eq!(reloaded.current("ada").await.grade, 12);
        assert_eq!(reloaded.current("bo").await.name, "Bo");
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_update_mirrors_to_remote() {
        let dir = scratch_dir();
        let remote = Arc::new(MemoryStore::new());
        remote.insert_user(UserRecord::new("u1", None)).await;
        let service = ProfileService::new(ProfileStore::new(&dir), remote.clone());

        let mut profile = service.current("u1").await;
        profile.grade = 12;
        profile.academic_honors = Some(String::new());
        let saved = service.update("u1", profile).await.unwrap();

        assert_eq!(saved.academic_honors, None);
        assert_eq!(service.current("u1").await.grade, 12);
        let mirrored = remote.get_user("u1").await.unwrap().profile.unwrap();
        assert_eq!(mirrored.grade, 12);
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
