use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use common::demo_events::GameEvents;
use std::sync::Arc;

use crate::analysis::AnalysisData;
use crate::storage::DemoStorage;
use crate::ApiError;

struct ParseState {
    storage: Box<dyn DemoStorage>,
    default_source: String,
    output_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, serde::Deserialize)]
struct SourceQuery {
    source: Option<String>,
}

pub fn router(config: &crate::Config) -> axum::Router {
    axum::Router::new()
        .route(
            "/parsedemo",
            axum::routing::get(parse_source).post(parse_upload).layer(
                axum::extract::DefaultBodyLimit::max(config.upload_limit()),
            ),
        )
        .with_state(Arc::new(ParseState {
            storage: Box::new(crate::storage::SourceStorage::new(
                &config.demo_folder,
                config.upload_limit(),
            )),
            default_source: config.demo_source.clone(),
            output_dir: config.output_dir.clone(),
        }))
}

#[tracing::instrument(skip(state))]
async fn parse_source(
    State(state): State<Arc<ParseState>>,
    Query(query): Query<SourceQuery>,
) -> Result<Response, ApiError> {
    let location = query
        .source
        .unwrap_or_else(|| state.default_source.clone());
    tracing::info!("Parsing demo from {:?}", location);

    let input = state.storage.load(location.clone()).await?;
    let events = crate::analysis::analyse(input).await?;

    respond(&state, &location, &events).await
}

#[tracing::instrument(skip(state, form))]
async fn parse_upload(
    State(state): State<Arc<ParseState>>,
    form: Multipart,
) -> Result<Response, ApiError> {
    let upload = crate::get_demo_from_upload("demo", form)
        .await?
        .ok_or(ApiError::MissingUpload("demo"))?;
    tracing::info!(
        "Parsing uploaded demo {:?} with {} bytes",
        upload.file_name,
        upload.data.len()
    );

    let input = AnalysisData::Preloaded(upload.data);
    let events = crate::analysis::analyse(input).await?;

    let name = upload.file_name.unwrap_or_else(|| "upload.dem".to_owned());
    respond(&state, &name, &events).await
}

async fn respond(
    state: &ParseState,
    location: &str,
    events: &GameEvents,
) -> Result<Response, ApiError> {
    let body = crate::serializer::render(events)?;

    if let Some(output_dir) = state.output_dir.as_ref() {
        let path = output_dir.join(crate::serializer::output_file_name(location));
        if let Err(source) = tokio::fs::write(&path, &body).await {
            return Err(ApiError::Output { path, source });
        }

        tracing::debug!("Stored events in {:?}", path);
    }

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tower::ServiceExt;

    const BOUNDARY: &str = "demo-boundary";

    fn scratch_folder(name: &str) -> PathBuf {
        let folder =
            std::env::temp_dir().join(format!("backend-api-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&folder).unwrap();
        folder
    }

    fn config(folder: &std::path::Path) -> crate::Config {
        crate::Config {
            listen: "127.0.0.1:0".parse().unwrap(),
            demo_source: "default.dem".to_owned(),
            demo_folder: folder.to_path_buf(),
            output_dir: None,
            upload_limit_mb: 1,
        }
    }

    fn multipart(field: &str, content: &[u8]) -> Body {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"bad.dem\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    async fn error_message(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: common::ErrorResponse = serde_json::from_slice(&body).unwrap();
        payload.error
    }

    #[tokio::test]
    async fn missing_source_is_a_bad_gateway() {
        let folder = scratch_folder("missing");
        let app = crate::app(&config(&folder));

        let request = Request::builder()
            .uri("/api/parsedemo?source=nothing-here.dem")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(StatusCode::BAD_GATEWAY, response.status());
        assert!(error_message(response).await.contains("nothing-here.dem"));
    }

    async fn rejected_source(source: &str) {
        let folder = scratch_folder("outside");
        let app = crate::app(&config(&folder));

        let request = Request::builder()
            .uri(format!("/api/parsedemo?source={}", source))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(StatusCode::BAD_REQUEST, response.status());
        assert!(error_message(response).await.contains("invalid demo location"));
    }

    #[tokio::test]
    async fn absolute_source_is_rejected() {
        rejected_source("/etc/hostname").await;
    }

    #[tokio::test]
    async fn parent_source_is_rejected() {
        rejected_source("../x.dem").await;
    }

    #[tokio::test]
    async fn undecodable_default_source() {
        let folder = scratch_folder("garbage");
        std::fs::write(
            folder.join("default.dem"),
            b"HL2DEMO\0this is not a source 2 demo at all, just some bytes",
        )
        .unwrap();

        let mut config = config(&folder);
        let output_dir = folder.join("out");
        std::fs::create_dir_all(&output_dir).unwrap();
        config.output_dir = Some(output_dir.clone());

        let app = crate::app(&config);

        let request = Request::builder()
            .uri("/api/parsedemo")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, response.status());
        assert!(error_message(response).await.starts_with("parsing demo"));

        // Nothing partial is written either
        assert!(!output_dir.join("default.json").exists());
    }

    #[tokio::test]
    async fn undecodable_upload() {
        let folder = scratch_folder("upload");
        let app = crate::app(&config(&folder));

        let request = Request::builder()
            .method("POST")
            .uri("/api/parsedemo")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart("demo", b"definitely not a demo file, only text"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, response.status());
    }

    #[tokio::test]
    async fn upload_without_demo_field() {
        let folder = scratch_folder("field");
        let app = crate::app(&config(&folder));

        let request = Request::builder()
            .method("POST")
            .uri("/api/parsedemo")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart("replay", b"some bytes"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(StatusCode::BAD_REQUEST, response.status());
        assert_eq!(
            "missing multipart field \"demo\"",
            error_message(response).await
        );
    }

    #[tokio::test]
    async fn upload_over_limit() {
        let folder = scratch_folder("limit");
        let app = crate::app(&config(&folder));

        let content = vec![0_u8; 2 * 1024 * 1024];
        let request = Request::builder()
            .method("POST")
            .uri("/api/parsedemo")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart("demo", &content))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(StatusCode::PAYLOAD_TOO_LARGE, response.status());
    }

    #[tokio::test]
    async fn respond_writes_document() {
        let folder = scratch_folder("respond");
        let state = ParseState {
            storage: Box::new(crate::storage::FileStorage::new(&folder)),
            default_source: "default.dem".to_owned(),
            output_dir: Some(folder.clone()),
        };

        let response = respond(&state, "https://example.com/match.dem", &GameEvents::default())
            .await
            .unwrap();

        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            "application/json",
            response.headers()[header::CONTENT_TYPE].to_str().unwrap()
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let stored = std::fs::read(folder.join("match.json")).unwrap();
        assert_eq!(body.to_vec(), stored);

        let parsed: GameEvents = serde_json::from_slice(&body).unwrap();
        assert_eq!(GameEvents::default(), parsed);
    }
}
