// src/cdn.rs
use crate::config::Config;
use crate::error::AppError;
use actix_web::web::Bytes;
use uuid::Uuid;

pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Folders uploads may land in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadFolder {
    Episodes,
    Movies,
    Profiles,
    Popups,
    Articles,
}

impl UploadFolder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "episodes" => Some(UploadFolder::Episodes),
            "movies" => Some(UploadFolder::Movies),
            "profiles" => Some(UploadFolder::Profiles),
            "popups" => Some(UploadFolder::Popups),
            "articles" => Some(UploadFolder::Articles),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadFolder::Episodes => "episodes",
            UploadFolder::Movies => "movies",
            UploadFolder::Profiles => "profiles",
            UploadFolder::Popups => "popups",
            UploadFolder::Articles => "articles",
        }
    }
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

#[derive(Clone, Debug)]
struct CdnSettings {
    storage_url: String,
    api_key: String,
    public_url: String,
}

/// Storage-zone client: files are PUT to the storage endpoint and served
/// from the public pull URL.
#[derive(Clone)]
pub struct CdnClient {
    http: reqwest::Client,
    settings: Option<CdnSettings>,
}

impl CdnClient {
    pub fn from_config(config: &Config) -> Self {
        let settings = match (
            &config.cdn_storage_url,
            &config.cdn_api_key,
            &config.cdn_public_url,
        ) {
            (Some(storage), Some(key), Some(public)) => Some(CdnSettings {
                storage_url: storage.trim_end_matches('/').to_string(),
                api_key: key.clone(),
                public_url: public.trim_end_matches('/').to_string(),
            }),
            _ => {
                tracing::warn!("CDN is not configured; uploads are disabled");
                None
            }
        };
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    pub fn object_path(folder: UploadFolder, filename: &str) -> String {
        format!("{}/{}-{}", folder.as_str(), Uuid::new_v4(), filename)
    }

    /// Uploads `body` and returns its public URL.
    pub async fn upload(
        &self,
        folder: UploadFolder,
        filename: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<String, AppError> {
        let settings = self
            .settings
            .as_ref()
            .ok_or(AppError::Unavailable("File storage is not configured"))?;
        let filename = sanitize_filename(filename)
            .ok_or_else(|| AppError::validation("filename is invalid"))?;
        let path = Self::object_path(folder, &filename);

        let response = self
            .http
            .put(format!("{}/{}", settings.storage_url, path))
            .header("AccessKey", &settings.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("CDN request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::internal(format!(
                "CDN rejected upload of {} with status {}",
                path,
                response.status()
            )));
        }

        tracing::info!("Uploaded {} to CDN", path);
        Ok(format!("{}/{}", settings.public_url, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_parse_from_route_segment() {
        assert_eq!(UploadFolder::parse("episodes"), Some(UploadFolder::Episodes));
        assert_eq!(UploadFolder::parse("secrets"), None);
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("intro ep 1.mp3").as_deref(), Some("intro_ep_1.mp3"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\music\\song.wav").as_deref(), Some("song.wav"));
        assert_eq!(sanitize_filename(".hidden").as_deref(), Some("hidden"));
        assert!(sanitize_filename("   ").is_none());
    }

    #[test]
    fn object_path_is_prefixed_by_folder() {
        let path = CdnClient::object_path(UploadFolder::Movies, "poster.png");
        assert!(path.starts_with("movies/"));
        assert!(path.ends_with("-poster.png"));
    }

    #[actix_web::test]
    async fn unconfigured_client_reports_unavailable() {
        let client = CdnClient::from_config(&crate::test_support::test_config());
        let result = client
            .upload(UploadFolder::Popups, "a.png", "image/png", Bytes::from_static(&[1, 2, 3]))
            .await;
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }
}
