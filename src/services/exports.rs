use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("export file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("export token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportClaims {
    export_id: Uuid,
    exp: i64,
}

/// A written export and the link that can fetch it.
#[derive(Debug, Serialize)]
pub struct ExportHandle {
    pub export_id: Uuid,
    pub download_url: String,
}

/// Local-disk CSV exports behind signed, expiring download links. The link
/// token is an HS256 JWT binding the export id to an expiry; the download
/// path re-checks both before touching the file.
pub struct ExportService {
    dir: PathBuf,
}

impl ExportService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config() -> Self {
        Self::new(&config::config().exports.dir)
    }

    /// Write a CSV and mint its signed download link.
    pub fn write_csv(
        &self,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> Result<ExportHandle, ExportError> {
        std::fs::create_dir_all(&self.dir)?;
        let export_id = Uuid::new_v4();

        let mut writer = csv::Writer::from_path(self.path_for(export_id))?;
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        let token = self.sign(export_id)?;
        Ok(ExportHandle {
            export_id,
            download_url: format!("/api/v2/exports/{}/download?token={}", export_id, token),
        })
    }

    /// Check signature, expiry and id match, then read the file.
    pub async fn open(&self, export_id: Uuid, token: &str) -> Result<Vec<u8>, ExportError> {
        self.verify(export_id, token)?;

        match tokio::fs::read(self.path_for(export_id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ExportError::NotFound(format!("Export {} not found", export_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, export_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.csv", export_id))
    }

    fn sign(&self, export_id: Uuid) -> Result<String, ExportError> {
        let security = &config::config().security;
        let claims = ExportClaims {
            export_id,
            exp: (Utc::now() + chrono::Duration::hours(security.export_link_ttl_hours as i64))
                .timestamp(),
        };
        let key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &key)?)
    }

    fn verify(&self, export_id: Uuid, token: &str) -> Result<(), ExportError> {
        let secret = &config::config().security.jwt_secret;
        let key = DecodingKey::from_secret(secret.as_bytes());
        let data = decode::<ExportClaims>(token, &key, &Validation::default())?;

        if data.claims.export_id != export_id {
            return Err(ExportError::InvalidToken(
                "Token does not match this export".to_string(),
            ));
        }
        Ok(())
    }
}
