//! Upload endpoint
//!
//! Parses a `multipart/form-data` body, streams every file part under the
//! configured field into the folder picked by the classification header, and
//! answers with a JSON summary.

use crate::config::AppState;
use crate::error::UploadError;
use crate::http::{self, HttpResponse};
use crate::logger;
use crate::routing::FormType;
use crate::storage::{StoredFile, UploadBatch};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use multer::{Constraints, Multipart, SizeLimit};
use serde::Serialize;

pub const UPLOAD_PATH: &str = "/upload";

const SUCCESS_MESSAGE: &str = "Files uploaded successfully!";

/// Body of a successful upload response
#[derive(Debug, Serialize)]
pub struct UploadSummary {
    pub message: &'static str,
    pub count: usize,
    pub folder: &'static str,
}

/// Handle `POST /upload`
pub async fn handle_upload<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let form = FormType::from_headers(req.headers(), &state.config.upload.classification_header);

    match receive(req, state, form).await {
        Ok(stored) => {
            logger::log_upload_stored(stored.len(), form.label());
            for file in &stored {
                logger::log_debug(&format!(
                    "[Upload] {} -> {} ({} bytes)",
                    file.original_name,
                    file.path.display(),
                    file.size
                ));
            }
            http::json_response(
                StatusCode::OK,
                &UploadSummary {
                    message: SUCCESS_MESSAGE,
                    count: stored.len(),
                    folder: form.label(),
                },
            )
        }
        Err(err) => {
            if matches!(err, UploadError::Storage(_)) {
                logger::log_upload_failed(&err);
            } else {
                logger::log_upload_rejected(&err.to_string());
            }
            http::json_error(err.status_code(), &err.user_message())
        }
    }
}

/// Parse the body and store its files; nothing is left behind on error
async fn receive<B>(
    req: Request<B>,
    state: &AppState,
    form: FormType,
) -> Result<Vec<StoredFile>, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = state.config.http.max_body_size;
    check_content_length(req.headers(), limit)?;

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(content_type).map_err(UploadError::NotMultipart)?;

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
    let mut multipart =
        Multipart::with_constraints(req.into_body().into_data_stream(), boundary, constraints);

    let mut batch = UploadBatch::new(form.destination(&state.upload_root));
    match read_parts(&mut multipart, &mut batch, &state.config.upload.field_name).await {
        Ok(()) if batch.is_empty() => Err(UploadError::NoFiles),
        Ok(()) => Ok(batch.commit().await?),
        Err(err) => {
            batch.rollback().await;
            Err(err)
        }
    }
}

/// Reject bodies that announce more than `limit` bytes before reading them
fn check_content_length(headers: &HeaderMap, limit: u64) -> Result<(), UploadError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(size) if size > limit => Err(UploadError::TooLarge { limit }),
        _ => Ok(()),
    }
}

/// Stage every file part under `field_name`, in arrival order.
///
/// Parts without a filename (plain form fields) and parts with an empty
/// filename (a file input left blank) are skipped.
async fn read_parts(
    multipart: &mut Multipart<'_>,
    batch: &mut UploadBatch,
    field_name: &str,
) -> Result<(), UploadError> {
    while let Some(mut field) = multipart.next_field().await.map_err(UploadError::from_multer)? {
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
        else {
            continue;
        };

        if field.name() != Some(field_name) {
            return Err(UploadError::UnexpectedField {
                field: field.name().unwrap_or_default().to_string(),
            });
        }

        let received_at_ms = chrono::Utc::now().timestamp_millis();
        let mut writer = batch.stage(&file_name, received_at_ms).await?;
        while let Some(chunk) = field.chunk().await.map_err(UploadError::from_multer)? {
            writer.write_chunk(&chunk).await?;
        }
        writer.finish().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        body_bytes, body_json, files_in, multipart_body, request, upload_request, Part, TestApp,
    };
    use hyper::header::HeaderValue;
    use hyper::Method;
    use std::fs;

    fn file<'a>(file_name: &'a str, data: &'a [u8]) -> Part<'a> {
        Part {
            field: "files",
            file_name: Some(file_name),
            data,
        }
    }

    #[tokio::test]
    async fn test_png_upload_lands_in_form_b() {
        let app = TestApp::new();
        let body = multipart_body(&[file("photo.png", b"\x89PNG fake image")]);
        let resp = app.send(upload_request(Some("B"), body)).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "Files uploaded successfully!");
        assert_eq!(json["count"], 1);
        assert_eq!(json["folder"], "FormB");

        let stored = files_in(&app.upload_dir().join("FormB"));
        assert_eq!(stored.len(), 1);
        let name = stored[0].file_name().unwrap().to_str().unwrap().to_string();
        let stem = name.strip_suffix(".png").expect("extension kept");
        assert!(stem.parse::<i64>().is_ok(), "timestamp name, got {name}");
        assert_eq!(fs::read(&stored[0]).unwrap(), b"\x89PNG fake image");

        // Stored files are reachable through static serving, byte for byte
        let resp = app
            .send(request(Method::GET, &format!("/FormB/{name}")))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await.as_ref(), b"\x89PNG fake image");
    }

    #[tokio::test]
    async fn test_every_part_stored_in_form_a() {
        let app = TestApp::new();
        let body = multipart_body(&[
            file("scan.pdf", b"pdf bytes"),
            file("page.png", b"png bytes"),
            file("notes.txt", b"txt bytes"),
        ]);
        let resp = app.send(upload_request(Some("A"), body)).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["count"], 3);
        assert_eq!(json["folder"], "FormA");

        let stored = files_in(&app.upload_dir().join("FormA"));
        assert_eq!(stored.len(), 3);
        for (ext, content) in [("pdf", "pdf bytes"), ("png", "png bytes"), ("txt", "txt bytes")] {
            let path = stored
                .iter()
                .find(|p| p.extension().is_some_and(|e| e == ext))
                .unwrap_or_else(|| panic!("no .{ext} file stored"));
            assert_eq!(fs::read_to_string(path).unwrap(), content);
        }
    }

    #[tokio::test]
    async fn test_same_extension_files_all_kept() {
        let app = TestApp::new();
        let body = multipart_body(&[
            file("a.jpg", b"first"),
            file("b.jpg", b"second"),
            file("c.jpg", b"third"),
        ]);
        let resp = app.send(upload_request(Some("A"), body)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let mut contents: Vec<String> = files_in(&app.upload_dir().join("FormA"))
            .iter()
            .map(|p| fs::read_to_string(p).unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_unrecognized_tag_goes_to_root() {
        for tag in [None, Some(""), Some("C"), Some("a")] {
            let app = TestApp::new();
            let body = multipart_body(&[file("doc.txt", b"doc")]);
            let resp = app.send(upload_request(tag, body)).await;

            assert_eq!(resp.status(), StatusCode::OK);
            // reported as FormB while the file itself stays in the root
            assert_eq!(body_json(resp).await["folder"], "FormB");
            let stored = files_in(&app.upload_dir());
            assert_eq!(stored.len(), 1, "tag {tag:?}");
            assert!(stored[0].is_file());
            assert!(!app.upload_dir().join("FormA").exists());
            assert!(!app.upload_dir().join("FormB").exists());
        }
    }

    #[tokio::test]
    async fn test_no_files_is_rejected() {
        let app = TestApp::new();
        let resp = app.send(upload_request(Some("A"), multipart_body(&[]))).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "No files were uploaded");
        assert!(!app.upload_dir().exists());
    }

    #[tokio::test]
    async fn test_text_fields_and_blank_inputs_are_not_files() {
        let app = TestApp::new();
        let body = multipart_body(&[
            Part {
                field: "comment",
                file_name: None,
                data: b"hello",
            },
            file("", b""),
        ]);
        let resp = app.send(upload_request(Some("B"), body)).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "No files were uploaded");
    }

    #[tokio::test]
    async fn test_text_field_alongside_file() {
        let app = TestApp::new();
        let body = multipart_body(&[
            Part {
                field: "comment",
                file_name: None,
                data: b"hello",
            },
            file("a.txt", b"file"),
        ]);
        let resp = app.send(upload_request(None, body)).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["count"], 1);
    }

    #[tokio::test]
    async fn test_unexpected_field_rolls_back() {
        let app = TestApp::new();
        let body = multipart_body(&[
            file("a.txt", b"kept?"),
            Part {
                field: "avatar",
                file_name: Some("b.txt"),
                data: b"wrong field",
            },
        ]);
        let resp = app.send(upload_request(Some("A"), body)).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Unexpected file field 'avatar'");
        assert!(files_in(&app.upload_dir().join("FormA")).is_empty());
    }

    #[tokio::test]
    async fn test_not_multipart() {
        let app = TestApp::new();
        let mut req = upload_request(Some("A"), b"{\"files\": []}".to_vec());
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let resp = app.send(req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!app.upload_dir().exists());
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let app = TestApp::new();
        let mut body = multipart_body(&[file("a.txt", b"0123456789")]);
        body.truncate(body.len() - 20);
        let resp = app.send(upload_request(Some("A"), body)).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(files_in(&app.upload_dir().join("FormA")).is_empty());
    }

    #[tokio::test]
    async fn test_declared_length_over_limit() {
        let app = TestApp::with_config(|c| c.http.max_body_size = 1024);
        let mut req = upload_request(Some("A"), multipart_body(&[file("a.txt", b"x")]));
        req.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("4096"));
        let resp = app.send(req).await;

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!app.upload_dir().exists());
    }

    #[tokio::test]
    async fn test_streamed_body_over_limit() {
        let app = TestApp::with_config(|c| c.http.max_body_size = 64);
        let body = multipart_body(&[file("big.bin", &[7u8; 512])]);
        let resp = app.send(upload_request(Some("A"), body)).await;

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(files_in(&app.upload_dir().join("FormA")).is_empty());
    }

    #[tokio::test]
    async fn test_filesystem_failure_is_500() {
        let app = TestApp::new();
        // A regular file where the FormA directory should be
        app.put_upload("FormA", b"in the way");

        let body = multipart_body(&[file("a.txt", b"data")]);
        let resp = app.send(upload_request(Some("A"), body)).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "Failed to store uploaded files");
        assert_eq!(fs::read(app.upload_dir().join("FormA")).unwrap(), b"in the way");
    }

    #[tokio::test]
    async fn test_custom_field_and_header_names() {
        let app = TestApp::with_config(|c| {
            c.upload.field_name = "scans".to_string();
            c.upload.classification_header = "x-form".to_string();
        });
        let body = multipart_body(&[Part {
            field: "scans",
            file_name: Some("a.tif"),
            data: b"tiff",
        }]);
        let mut req = upload_request(None, body);
        req.headers_mut().insert("x-form", HeaderValue::from_static("B"));
        let resp = app.send(req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["folder"], "FormB");
        assert_eq!(files_in(&app.upload_dir().join("FormB")).len(), 1);
    }

    #[test]
    fn test_check_content_length() {
        let mut headers = HeaderMap::new();
        assert!(check_content_length(&headers, 10).is_ok());

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("10"));
        assert!(check_content_length(&headers, 10).is_ok());

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("11"));
        assert!(matches!(
            check_content_length(&headers, 10),
            Err(UploadError::TooLarge { limit: 10 })
        ));

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("not-a-number"));
        assert!(check_content_length(&headers, 10).is_ok());
    }
}
