//! HTTP handlers (upload form, upload, download).

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use zipdrop_core::app::Pipeline;
use zipdrop_core::domain::{ArchiveId, ArchiveInfo, ErrorKind, PipelineError, UploadedItem};

/// multipart のフィールド名
const FILES_FIELD: &str = "files";

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>zipdrop</title></head>
<body>
<h1>zipdrop</h1>
<form action="/upload" method="post" enctype="multipart/form-data">
<input type="file" name="files" multiple required>
<button type="submit">Create zip</button>
</form>
</body>
</html>
"#;

/// Create the Axum router.
pub fn router(pipeline: Arc<Pipeline>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/upload", post(upload))
        .route("/download/{token}", get(download))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(pipeline)
}

async fn home() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

/// `files` パートをすべて読み、1 つの ZIP にして download ページへ 303
async fn upload(State(pipeline): State<Arc<Pipeline>>, mut multipart: Multipart) -> Response {
    let mut items = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "could not parse upload form");
                return (e.status(), e.body_text()).into_response();
            }
        };
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                warn!(file = %name, error = %e, "could not read uploaded file");
                return (e.status(), e.body_text()).into_response();
            }
        };
        // ファイル未選択のとき、ブラウザは空のパートを送ってくる
        if name.is_empty() && data.is_empty() {
            continue;
        }
        items.push(UploadedItem::from_reader(name, Cursor::new(data)));
    }

    match pipeline.submit(items).await {
        Ok(id) => redirect_to_download(&id),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    dl: Option<String>,
}

#[derive(Debug, Serialize)]
struct DownloadPage {
    #[serde(flatten)]
    info: ArchiveInfo,
    file_name: String,
    download_url: String,
}

/// `?dl=1` なら ZIP 本体、それ以外はメタ情報
///
/// ブラウザ（`Accept: text/html`）にはリンク付きの HTML、それ以外には JSON。
async fn download(
    State(pipeline): State<Arc<Pipeline>>,
    Path(token): Path<String>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> Response {
    if query.dl.as_deref() == Some("1") {
        return match pipeline.retrieve(&token).await {
            Ok(blob) => {
                let file_name = ArchiveId::from_token(&token)
                    .map(|id| id.file_name())
                    .unwrap_or_else(|_| "archive.zip".to_string());
                (
                    [
                        (header::CONTENT_TYPE, "application/zip".to_string()),
                        (
                            header::CONTENT_DISPOSITION,
                            format!("attachment; filename=\"{file_name}\""),
                        ),
                    ],
                    blob,
                )
                    .into_response()
            }
            Err(e) => error_response(e),
        };
    }

    match pipeline.info(&token).await {
        Ok(info) => {
            let file_name = info.id.file_name();
            let download_url = format!("/download/{file_name}?dl=1");
            let page = DownloadPage {
                info,
                file_name,
                download_url,
            };
            if accepts_html(&headers) {
                Html(page.to_html()).into_response()
            } else {
                Json(page).into_response()
            }
        }
        Err(e) => error_response(e),
    }
}

impl DownloadPage {
    /// file_name は検証済み ID 由来（数字と `-` のみ）なのでエスケープ不要
    fn to_html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>zipdrop - {name}</title></head>
<body>
<h1>zipdrop</h1>
<p><a href="{url}">Download {name}</a> ({size} bytes, created {created})</p>
<p><a href="/">Upload more files</a></p>
</body>
</html>
"#,
            name = self.file_name,
            url = self.download_url,
            size = self.info.size,
            created = self.info.created_at.to_rfc3339(),
        )
    }
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// 303 See Other
fn redirect_to_download(id: &ArchiveId) -> Response {
    Redirect::to(&format!("/download/{}", id.file_name())).into_response()
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Input => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: PipelineError) -> Response {
    let status = status_for(err.kind());
    if status.is_server_error() {
        error!(error = %err, "request failed");
        return (status, "internal error").into_response();
    }
    (status, err.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::SocketAddr;

    use reqwest::multipart::{Form, Part};
    use reqwest::{Client, redirect};
    use tokio::net::TcpListener;
    use zip::ZipArchive;
    use zipdrop_core::app::AppBuilder;
    use zipdrop_core::domain::{InvalidIdentifier, StoreError};
    use zipdrop_core::impls::InMemoryArchiveStore;

    /// router を 127.0.0.1 の空きポートで起動
    async fn spawn_server(max_upload_bytes: usize) -> SocketAddr {
        let app = AppBuilder::new()
            .store(Arc::new(InMemoryArchiveStore::new()))
            .build()
            .unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = router(app.pipeline(), max_upload_bytes);
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn client() -> Client {
        Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap()
    }

    fn file_part(name: &str, content: &[u8]) -> Part {
        Part::bytes(content.to_vec()).file_name(name.to_string())
    }

    fn extract(blob: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(std::io::Cursor::new(blob)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[tokio::test]
    async fn upload_redirects_to_a_downloadable_zip() {
        let addr = spawn_server(1024 * 1024).await;
        let client = client();

        let form = Form::new()
            .part("files", file_part("a.txt", b"hello"))
            .part("files", file_part("b.txt", b"world"))
            .text("comment", "not a file");
        let resp = client
            .post(format!("http://{addr}/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        let location = resp.headers()[reqwest::header::LOCATION]
            .to_str()
            .unwrap()
            .to_string();
        let file_name = location.strip_prefix("/download/").unwrap().to_string();
        assert!(file_name.ends_with(".zip"));

        // ページ（JSON）
        let page: serde_json::Value = client
            .get(format!("http://{addr}{location}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(page["file_name"], file_name.as_str());
        assert_eq!(page["download_url"], format!("/download/{file_name}?dl=1"));
        assert_eq!(
            format!("{}.zip", page["id"].as_str().unwrap()),
            file_name
        );

        // 本体
        let resp = client
            .get(format!("http://{addr}{location}?dl=1"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.headers()[reqwest::header::CONTENT_TYPE], "application/zip");
        assert_eq!(
            resp.headers()[reqwest::header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap(),
            format!("attachment; filename=\"{file_name}\"")
        );
        let blob = resp.bytes().await.unwrap();
        assert_eq!(page["size"], blob.len() as u64);
        assert_eq!(
            extract(&blob),
            vec![
                ("a.txt".to_string(), b"hello".to_vec()),
                ("b.txt".to_string(), b"world".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn browser_gets_html_download_page() {
        let addr = spawn_server(1024 * 1024).await;
        let client = client();

        let form = Form::new().part("files", file_part("a.txt", b"hello"));
        let resp = client
            .post(format!("http://{addr}/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let location = resp.headers()[reqwest::header::LOCATION]
            .to_str()
            .unwrap()
            .to_string();

        let resp = client
            .get(format!("http://{addr}{location}"))
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert!(
            resp.headers()[reqwest::header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        let body = resp.text().await.unwrap();
        assert!(body.contains(&format!(r#"href="{location}?dl=1""#)));
    }

    #[tokio::test]
    async fn upload_with_only_an_empty_part_is_bad_request() {
        let addr = spawn_server(1024 * 1024).await;

        // ファイル未選択で送信したブラウザと同じ形
        let form = Form::new().part("files", Part::bytes(Vec::new()));
        let resp = client()
            .post(format!("http://{addr}/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let addr = spawn_server(1024).await;

        let form = Form::new().part("files", file_part("big.bin", &[7u8; 4096]));
        let resp = client()
            .post(format!("http://{addr}/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn unknown_and_malformed_tokens_are_not_found() {
        let addr = spawn_server(1024 * 1024).await;
        let client = client();

        for path in [
            "/download/1704110400.zip",
            "/download/nonexistent",
            "/download/..%2F..%2Fetc%2Fpasswd",
            "/download/1704110400.zip?dl=1",
        ] {
            let resp = client
                .get(format!("http://{addr}{path}"))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[test]
    fn error_kinds_map_to_status_codes() {
        assert_eq!(
            error_response(PipelineError::EmptyInput).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(PipelineError::InvalidIdentifier(InvalidIdentifier(
                "nonexistent".into()
            )))
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(PipelineError::Store(StoreError::Io(std::io::Error::other(
                "disk"
            ))))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn redirect_points_at_download_page() {
        let response = redirect_to_download(&ArchiveId::from_parts(1_704_110_400, 1));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/download/1704110400-1.zip"
        );
    }
}
