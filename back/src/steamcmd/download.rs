use std::path::Path;

use futures::StreamExt;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, info, instrument};

use crate::error::DownloadError;

/// Stream `url` into `destination`, reporting `(downloaded, total)` bytes for every chunk.
///
/// `total` is `None` when the server does not declare a content length.
#[instrument(skip(client, on_progress))]
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
    mut on_progress: impl FnMut(u64, Option<u64>),
) -> Result<u64, DownloadError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status(status.as_u16()));
    }

    let total = response.content_length().filter(|length| *length > 0);
    debug!(?total, "Download started");

    let mut file = File::create(destination).await?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;

        downloaded += chunk.len() as u64;
        on_progress(downloaded, total);
    }

    file.flush().await?;
    info!(downloaded, "Download finished");

    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn writes_body_and_reports_progress() {
        let mock_server = MockServer::start().await;
        let tmp = TempDir::new().unwrap();
        let body = vec![7u8; 64 * 1024];

        Mock::given(method("GET"))
            .and(path("/steamcmd.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&mock_server)
            .await;

        let destination = tmp.path().join("steamcmd.zip");
        let mut last = (0, None);
        let downloaded = download_to_file(
            &reqwest::Client::new(),
            &format!("{}/steamcmd.zip", mock_server.uri()),
            &destination,
            |done, total| last = (done, total),
        )
        .await
        .unwrap();

        assert_eq!(downloaded, body.len() as u64);
        assert_eq!(last, (body.len() as u64, Some(body.len() as u64)));
        assert_eq!(std::fs::read(&destination).unwrap(), body);
    }

    #[tokio::test]
    async fn missing_file_is_a_status_error() {
        let mock_server = MockServer::start().await;
        let tmp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let result = download_to_file(
            &reqwest::Client::new(),
            &mock_server.uri(),
            &tmp.path().join("steamcmd.zip"),
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(DownloadError::Status(404))));
    }
}
