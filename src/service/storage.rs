// service/storage.rs
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::{config::Config, dtos::storagedtos::SignedUrlDto, error::HttpError};

type HmacSha256 = Hmac<Sha256>;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
const DOCUMENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "application/pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Avatars,
    IdDocuments,
    Receipts,
}

impl Bucket {
    pub fn parse(value: &str) -> Option<Bucket> {
        match value {
            "avatars" => Some(Bucket::Avatars),
            "id-documents" => Some(Bucket::IdDocuments),
            "receipts" => Some(Bucket::Receipts),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Avatars => "avatars",
            Bucket::IdDocuments => "id-documents",
            Bucket::Receipts => "receipts",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Bucket::Avatars)
    }

    pub fn allowed_types(&self) -> &'static [&'static str] {
        match self {
            Bucket::Avatars => IMAGE_TYPES,
            Bucket::IdDocuments | Bucket::Receipts => DOCUMENT_TYPES,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("File type {0} is not allowed here")]
    UnsupportedType(String),

    #[error("File is empty")]
    Empty,

    #[error("File exceeds the {max} byte limit")]
    TooLarge { max: usize },

    #[error("Invalid object path")]
    InvalidPath,

    #[error("Link has expired")]
    Expired,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("File not found")]
    NotFound,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for HttpError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::UnknownBucket(_)
            | StorageError::UnsupportedType(_)
            | StorageError::Empty
            | StorageError::TooLarge { .. }
            | StorageError::InvalidPath => HttpError::bad_request(error.to_string()),
            StorageError::Expired | StorageError::InvalidSignature => HttpError::forbidden(error.to_string()),
            StorageError::NotFound => HttpError::not_found(error.to_string()),
            StorageError::Io(e) => {
                tracing::error!("Storage I/O failure: {}", e);
                HttpError::server_error(crate::error::ErrorMessage::ServerError.to_string())
            }
        }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

/// Guess the content type of a stored object from its extension.
pub fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or_default() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Object paths are `owner/file`, relative, and never climb out of the bucket.
pub fn validate_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidPath);
    }
    Ok(())
}

/// The user that uploaded an object, taken from the first path segment.
pub fn owner_of(path: &str) -> Option<Uuid> {
    path.split('/').next().and_then(|segment| Uuid::parse_str(segment).ok())
}

/// Local-disk object storage with HMAC signed download links.
#[derive(Debug, Clone)]
pub struct StorageService {
    root: PathBuf,
    signing_key: Vec<u8>,
    app_url: String,
    max_upload_bytes: usize,
}

impl StorageService {
    pub fn new(config: &Config) -> Self {
        Self {
            root: PathBuf::from(&config.storage_root),
            signing_key: config.storage_signing_key.as_bytes().to_vec(),
            app_url: config.app_url.trim_end_matches('/').to_string(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    fn object_path(&self, bucket: Bucket, path: &str) -> Result<PathBuf, StorageError> {
        validate_path(path)?;
        Ok(self.root.join(bucket.as_str()).join(Path::new(path)))
    }

    pub fn check_upload(&self, bucket: Bucket, content_type: &str, size: usize) -> Result<(), StorageError> {
        if !bucket.allowed_types().contains(&content_type) {
            return Err(StorageError::UnsupportedType(content_type.to_string()));
        }
        if size == 0 {
            return Err(StorageError::Empty);
        }
        if size > self.max_upload_bytes {
            return Err(StorageError::TooLarge { max: self.max_upload_bytes });
        }
        Ok(())
    }

    /// Stores `bytes` and returns the object path relative to the bucket.
    pub async fn upload(
        &self,
        bucket: Bucket,
        owner_id: Uuid,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        self.check_upload(bucket, content_type, bytes.len())?;

        let path = format!("{}/{}.{}", owner_id, Uuid::new_v4(), extension_for(content_type));
        let full_path = self.object_path(bucket, &path)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;

        tracing::info!(
            "Stored {} ({} bytes) from {} as {}/{}",
            file_name,
            bytes.len(),
            owner_id,
            bucket.as_str(),
            path
        );
        Ok(path)
    }

    pub async fn read(&self, bucket: Bucket, path: &str) -> Result<Vec<u8>, StorageError> {
        let full_path = self.object_path(bucket, path)?;
        match tokio::fs::read(&full_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn mac(&self, bucket: Bucket, path: &str, expires: i64) -> Result<HmacSha256, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|_| StorageError::InvalidSignature)?;
        mac.update(format!("{}/{}:{}", bucket.as_str(), path, expires).as_bytes());
        Ok(mac)
    }

    pub fn sign(&self, bucket: Bucket, path: &str, expires: i64) -> Result<String, StorageError> {
        validate_path(path)?;
        Ok(hex::encode(self.mac(bucket, path, expires)?.finalize().into_bytes()))
    }

    pub fn signed_url(&self, bucket: Bucket, path: &str, ttl: Duration) -> Result<SignedUrlDto, StorageError> {
        let expires = (Utc::now() + ttl).timestamp();
        let signature = self.sign(bucket, path, expires)?;

        Ok(SignedUrlDto {
            url: format!(
                "{}/api/storage/{}/{}?expires={}&signature={}",
                self.app_url,
                bucket.as_str(),
                path,
                expires,
                signature
            ),
            expires_at: expires,
        })
    }

    /// Public URL for objects in public buckets.
    pub fn public_url(&self, bucket: Bucket, path: &str) -> String {
        format!("{}/api/storage/{}/{}", self.app_url, bucket.as_str(), path)
    }

    pub fn verify_signature(
        &self,
        bucket: Bucket,
        path: &str,
        expires: i64,
        signature: &str,
        now: i64,
    ) -> Result<(), StorageError> {
        validate_path(path)?;
        if expires < now {
            return Err(StorageError::Expired);
        }

        let provided = hex::decode(signature).map_err(|_| StorageError::InvalidSignature)?;
        self.mac(bucket, path, expires)?
            .verify_slice(&provided)
            .map_err(|_| StorageError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> StorageService {
        StorageService::new(&Config::for_tests())
    }

    #[test]
    fn rejects_traversal_and_absolute_paths() {
        assert!(validate_path("../etc/passwd").is_err());
        assert!(validate_path("owner/../../secret").is_err());
        assert!(validate_path("/abs/file.png").is_err());
        assert!(validate_path("owner\\file.png").is_err());
        assert!(validate_path("owner//file.png").is_err());
        assert!(validate_path("").is_err());
        assert!(validate_path("owner/file.png").is_ok());
    }

    #[test]
    fn signature_round_trip() {
        let storage = service();
        let now = Utc::now().timestamp();
        let expires = now + 60;
        let signature = storage.sign(Bucket::Receipts, "a/b.pdf", expires).unwrap();

        assert!(storage
            .verify_signature(Bucket::Receipts, "a/b.pdf", expires, &signature, now)
            .is_ok());
    }

    #[test]
    fn tampered_or_expired_links_fail() {
        let storage = service();
        let now = Utc::now().timestamp();
        let expires = now + 60;
        let signature = storage.sign(Bucket::Receipts, "a/b.pdf", expires).unwrap();

        assert!(matches!(
            storage.verify_signature(Bucket::Receipts, "a/c.pdf", expires, &signature, now),
            Err(StorageError::InvalidSignature)
        ));
        assert!(matches!(
            storage.verify_signature(Bucket::IdDocuments, "a/b.pdf", expires, &signature, now),
            Err(StorageError::InvalidSignature)
        ));
        assert!(matches!(
            storage.verify_signature(Bucket::Receipts, "a/b.pdf", expires + 1, &signature, now),
            Err(StorageError::InvalidSignature)
        ));
        assert!(matches!(
            storage.verify_signature(Bucket::Receipts, "a/b.pdf", expires, "zz", now),
            Err(StorageError::InvalidSignature)
        ));
        assert!(matches!(
            storage.verify_signature(Bucket::Receipts, "a/b.pdf", expires, &signature, expires + 1),
            Err(StorageError::Expired)
        ));
    }

    #[test]
    fn signed_url_points_at_storage_route() {
        let storage = service();
        let signed = storage
            .signed_url(Bucket::IdDocuments, "owner/doc.pdf", Duration::minutes(15))
            .unwrap();

        assert!(signed
            .url
            .starts_with("http://localhost:8000/api/storage/id-documents/owner/doc.pdf?expires="));
        assert!(signed.url.contains("&signature="));
        assert!(signed.expires_at > Utc::now().timestamp());
    }

    #[test]
    fn upload_checks_type_and_size() {
        let storage = service();
        assert!(matches!(
            storage.check_upload(Bucket::Avatars, "application/pdf", 10),
            Err(StorageError::UnsupportedType(_))
        ));
        assert!(storage.check_upload(Bucket::Receipts, "application/pdf", 10).is_ok());
        assert!(matches!(
            storage.check_upload(Bucket::Avatars, "image/png", 0),
            Err(StorageError::Empty)
        ));
        assert!(matches!(
            storage.check_upload(Bucket::Avatars, "image/png", 2048),
            Err(StorageError::TooLarge { max: 1024 })
        ));
    }

    #[tokio::test]
    async fn upload_then_read_back() {
        let storage = service();
        let owner = Uuid::new_v4();
        let path = storage
            .upload(Bucket::Avatars, owner, "me.png", "image/png", b"png-bytes")
            .await
            .unwrap();

        assert!(path.starts_with(&owner.to_string()));
        assert!(path.ends_with(".png"));
        assert_eq!(owner_of(&path), Some(owner));
        assert_eq!(content_type_for(&path), "image/png");

        let bytes = storage.read(Bucket::Avatars, &path).await.unwrap();
        assert_eq!(bytes, b"png-bytes");

        assert!(matches!(
            storage.read(Bucket::Avatars, &format!("{}/missing.png", owner)).await,
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn bucket_names() {
        assert_eq!(Bucket::parse("id-documents"), Some(Bucket::IdDocuments));
        assert_eq!(Bucket::parse("secrets"), None);
        assert!(Bucket::Avatars.is_public());
        assert!(!Bucket::Receipts.is_public());
    }
}
