//! Retrieval of the prepared archive.
//!
//! The archive lives at a fixed path on the backend ("the most recently
//! prepared archive for this session"). It is streamed straight to disk
//! chunk by chunk, or handed to the system browser.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Method;
use reqwest::header::CONTENT_DISPOSITION;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::ClassroomClient;
use crate::config::{DownloadMode, Endpoint};
use crate::error::ApiError;
use crate::navigator::Navigator;

/// Reference to the prepared archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAction {
    pub url: Url,
    /// File name used when the server does not suggest one.
    pub fallback_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    Saved { path: PathBuf, bytes: u64 },
    HandedToBrowser { url: Url },
}

/// Builds the download action for the most recently prepared archive.
///
/// # Errors
/// Returns an error if the configured URL is invalid.
pub fn retrieve(client: &ClassroomClient) -> Result<DownloadAction, ApiError> {
    Ok(DownloadAction {
        url: client.endpoint_url(Endpoint::CoursesServe)?,
        fallback_name: client.config().download.file_name.clone(),
    })
}

/// Delivers the archive according to `mode`.
///
/// # Errors
/// See [`save_to_dir`]; in browser mode, failure to launch the browser.
pub async fn deliver(
    client: &ClassroomClient,
    action: &DownloadAction,
    mode: DownloadMode,
    navigator: &dyn Navigator,
    directory: &Path,
    cancel: &CancellationToken,
) -> Result<Delivered, ApiError> {
    match mode {
        DownloadMode::File => {
            let (path, bytes) = save_to_dir(client, action, directory, cancel).await?;
            Ok(Delivered::Saved { path, bytes })
        }
        DownloadMode::Browser => {
            navigator
                .open_external(action.url.as_str())
                .map_err(ApiError::Navigation)?;
            Ok(Delivered::HandedToBrowser {
                url: action.url.clone(),
            })
        }
    }
}

/// Streams the archive into `directory`.
///
/// Bytes go to `<name>.part` first and are renamed on completion; the partial
/// file is removed on any failure, including cancellation. An existing file
/// of the same name is left alone and the archive gets a numbered name.
///
/// # Errors
/// `Unauthenticated` on 401, `Status` when the archive is not ready, transfer
/// and file-system failures.
pub async fn save_to_dir(
    client: &ClassroomClient,
    action: &DownloadAction,
    directory: &Path,
    cancel: &CancellationToken,
) -> Result<(PathBuf, u64), ApiError> {
    let endpoint = Endpoint::CoursesServe;
    let timeout = client.config().timeouts.download();
    let builder = client.request(Method::GET, endpoint)?;
    let response = client
        .send_checked(endpoint, builder, timeout, cancel)
        .await?;

    let file_name = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| action.fallback_name.clone());

    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|e| ApiError::io(directory, e))?;
    let part_path = directory.join(format!("{file_name}.part"));

    let result = stream_to_file(endpoint, response, &part_path, cancel).await;
    let bytes = match result {
        Ok(bytes) => bytes,
        Err(err) => {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(err);
        }
    };

    let path = match unused_path(directory, &file_name).await {
        Ok(path) => path,
        Err(err) => {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(err);
        }
    };
    tokio::fs::rename(&part_path, &path)
        .await
        .map_err(|e| ApiError::io(&path, e))?;
    tracing::info!(path = %path.display(), bytes, "archive saved");
    Ok((path, bytes))
}

async fn stream_to_file(
    endpoint: Endpoint,
    response: reqwest::Response,
    part_path: &Path,
    cancel: &CancellationToken,
) -> Result<u64, ApiError> {
    let mut file = tokio::fs::File::create(part_path)
        .await
        .map_err(|e| ApiError::io(part_path, e))?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ApiError::Cancelled { endpoint }),
            next = stream.next() => next,
        };
        let Some(chunk) = next else { break };
        let chunk = chunk.map_err(|e| ApiError::from_send(endpoint, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ApiError::io(part_path, e))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| ApiError::io(part_path, e))?;
    Ok(written)
}

/// Returns `directory/file_name`, or the first `stem (N).ext` variant that
/// does not exist yet, so an earlier archive is never overwritten.
async fn unused_path(directory: &Path, file_name: &str) -> Result<PathBuf, ApiError> {
    let mut candidate = directory.join(file_name);
    let mut n: u32 = 1;
    while tokio::fs::try_exists(&candidate)
        .await
        .map_err(|e| ApiError::io(&candidate, e))?
    {
        candidate = directory.join(numbered_name(file_name, n));
        n += 1;
    }
    Ok(candidate)
}

fn numbered_name(file_name: &str, n: u32) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{file_name} ({n})"),
    }
}

/// Extracts a safe file name from a `Content-Disposition` header.
fn filename_from_disposition(header: &str) -> Option<String> {
    let raw = header.split(';').map(str::trim).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("filename")
            .then(|| value.trim().trim_matches('"'))
    })?;

    // Never let the server pick a directory.
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition("attachment; filename=GCD_courses.zip").as_deref(),
            Some("GCD_courses.zip")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=\"my archive.zip\"").as_deref(),
            Some("my archive.zip")
        );
        assert_eq!(filename_from_disposition("attachment"), None);
    }

    #[test]
    fn test_filename_strips_directories() {
        assert_eq!(
            filename_from_disposition("attachment; filename=../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(filename_from_disposition("attachment; filename=.."), None);
    }

    #[test]
    fn test_numbered_name_keeps_extension() {
        assert_eq!(numbered_name("GCD_courses.zip", 1), "GCD_courses (1).zip");
        assert_eq!(numbered_name("archive", 2), "archive (2)");
        assert_eq!(numbered_name(".zip", 1), ".zip (1)");
    }
}
