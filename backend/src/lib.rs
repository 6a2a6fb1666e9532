pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod serializer;
pub mod storage;

pub use config::Config;
pub use error::ApiError;

/// The complete application, all routes live below `/api/`
pub fn app(config: &Config) -> axum::Router {
    axum::Router::new().nest("/api", api::router(config))
}

#[derive(Debug)]
pub struct UploadedDemo {
    pub file_name: Option<String>,
    pub data: axum::body::Bytes,
}

/// Finds the field called `name` and reads it completely.
///
/// Errors from the multipart stream, like exceeding the body limit, are passed
/// on so they can be reported as such.
pub async fn get_demo_from_upload(
    name: &str,
    mut form: axum::extract::Multipart,
) -> Result<Option<UploadedDemo>, axum::extract::multipart::MultipartError> {
    while let Some(field) = form.next_field().await? {
        if field.name().map(|n| n != name).unwrap_or(true) {
            continue;
        }

        let file_name = field.file_name().map(|n| n.to_owned());
        let data = field.bytes().await?;

        return Ok(Some(UploadedDemo { file_name, data }));
    }

    Ok(None)
}
