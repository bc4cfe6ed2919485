use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;
use crate::database::UserStore;
use crate::utils::{AppError, AppResult, PayloadError};

/// URL prefix under which the upload directory is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Maps an accepted image content type to the extension used on disk.
pub fn extension_for(content_type: &str) -> Result<&'static str, PayloadError> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/gif" => Ok("gif"),
        "image/webp" => Ok("webp"),
        other => Err(PayloadError::UnsupportedType(other.to_string())),
    }
}

pub fn check_size(len: usize, config: &Config) -> Result<(), PayloadError> {
    if len > config.max_upload_bytes {
        return Err(PayloadError::TooLarge {
            limit: config.max_upload_bytes,
        });
    }
    Ok(())
}

/// Resolves a stored `/uploads/<name>` path to its file in the upload directory.
/// Only the final component is used, so stored paths cannot escape the directory.
fn local_path(config: &Config, public_path: &str) -> Option<PathBuf> {
    let name = Path::new(public_path).file_name()?;
    Some(config.upload_dir.join(name))
}

/// Best-effort file removal; a missing file is not an error.
pub async fn remove_stored_file(config: &Config, public_path: &str) {
    let Some(path) = local_path(config, public_path) else {
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => log::info!("🗑️ Removed file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("File already gone: {}", path.display())
        }
        Err(e) => log::warn!("⚠️  Failed to remove {}: {}", path.display(), e),
    }
}

/// Stores a new profile picture and points the user record at it.
/// Returns the public path of the stored file.
pub async fn save_profile_picture(
    users: &dyn UserStore,
    config: &Config,
    user_id: &str,
    content_type: &str,
    bytes: &[u8],
) -> AppResult<String> {
    let extension = extension_for(content_type)?;
    check_size(bytes.len(), config)?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let previous = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
        .profile_picture;

    let file_name = format!("profile-{}-{}.{}", user_id, Uuid::new_v4().simple(), extension);
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::write(config.upload_dir.join(&file_name), bytes).await?;

    let public_path = format!("{}/{}", PUBLIC_PREFIX, file_name);

    if !users.set_profile_picture(user_id, Some(&public_path)).await? {
        // User vanished between the lookup and the update
        remove_stored_file(config, &public_path).await;
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if let Some(old) = previous.as_deref() {
        remove_stored_file(config, old).await;
    }

    log::info!("✅ Profile picture stored for {}: {}", user_id, public_path);
    Ok(public_path)
}

/// Clears the user's picture reference and removes the file. Idempotent.
pub async fn delete_profile_picture(
    users: &dyn UserStore,
    config: &Config,
    user_id: &str,
) -> AppResult<()> {
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let Some(path) = user.profile_picture else {
        return Ok(());
    };

    users.set_profile_picture(user_id, None).await?;
    remove_stored_file(config, &path).await;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::memory::InMemoryUserStore;
    use crate::models::User;

    pub(crate) fn temp_upload_config() -> Config {
        let dir = std::env::temp_dir().join(format!("evoting-uploads-{}", Uuid::new_v4().simple()));
        Config {
            upload_dir: dir,
            max_upload_bytes: 1024,
            ..Config::default()
        }
    }

    async fn store_with_user() -> (InMemoryUserStore, String) {
        let store = InMemoryUserStore::new();
        let user = User::new("budi".into(), "budi@binus.ac.id".into(), "h".into());
        store.insert(&user).await.unwrap();
        (store, user.user_id)
    }

    #[test]
    fn only_images_are_accepted() {
        assert_eq!(extension_for("image/png"), Ok("png"));
        assert_eq!(extension_for("IMAGE/JPEG"), Ok("jpg"));
        assert_eq!(
            extension_for("application/pdf"),
            Err(PayloadError::UnsupportedType("application/pdf".to_string()))
        );
    }

    #[test]
    fn stored_paths_cannot_escape_upload_dir() {
        let config = temp_upload_config();
        let path = local_path(&config, "/uploads/../../etc/passwd").unwrap();
        assert_eq!(path, config.upload_dir.join("passwd"));
    }

    #[tokio::test]
    async fn upload_then_delete_round_trip() {
        let (store, user_id) = store_with_user().await;
        let config = temp_upload_config();

        let public_path =
            save_profile_picture(&store, &config, &user_id, "image/png", b"\x89PNG fake")
                .await
                .unwrap();
        assert!(public_path.starts_with("/uploads/profile-"));
        assert!(public_path.ends_with(".png"));

        let on_disk = local_path(&config, &public_path).unwrap();
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"\x89PNG fake");

        let user = store.find_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(user.profile_picture.as_deref(), Some(public_path.as_str()));

        delete_profile_picture(&store, &config, &user_id).await.unwrap();
        assert!(!on_disk.exists());
        let user = store.find_by_id(&user_id).await.unwrap().unwrap();
        assert!(user.profile_picture.is_none());

        // Idempotent
        delete_profile_picture(&store, &config, &user_id).await.unwrap();
    }

    #[tokio::test]
    async fn replacing_picture_removes_previous_file() {
        let (store, user_id) = store_with_user().await;
        let config = temp_upload_config();

        let first = save_profile_picture(&store, &config, &user_id, "image/gif", b"GIF89a")
            .await
            .unwrap();
        let second = save_profile_picture(&store, &config, &user_id, "image/webp", b"RIFFxxxxWEBP")
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(!local_path(&config, &first).unwrap().exists());
        assert!(local_path(&config, &second).unwrap().exists());
    }

    #[tokio::test]
    async fn policy_violations_leave_user_untouched() {
        let (store, user_id) = store_with_user().await;
        let config = temp_upload_config();

        let oversized = vec![0u8; config.max_upload_bytes + 1];
        let err = save_profile_picture(&store, &config, &user_id, "image/png", &oversized)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Payload(PayloadError::TooLarge { limit: 1024 })));

        let err = save_profile_picture(&store, &config, &user_id, "text/html", b"<html>")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Payload(PayloadError::UnsupportedType(_))));

        let user = store.find_by_id(&user_id).await.unwrap().unwrap();
        assert!(user.profile_picture.is_none());
    }

    #[tokio::test]
    async fn deleting_when_file_is_already_gone_still_clears_reference() {
        let (store, user_id) = store_with_user().await;
        let config = temp_upload_config();
        store
            .set_profile_picture(&user_id, Some("/uploads/profile-missing.png"))
            .await
            .unwrap();

        delete_profile_picture(&store, &config, &user_id).await.unwrap();
        let user = store.find_by_id(&user_id).await.unwrap().unwrap();
        assert!(user.profile_picture.is_none());
    }
}
