//! Advertisement image uploads.

use std::path::Path;

use axum::extract::Multipart;
use chrono::Utc;
use log::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::models::NewAdvertisement;

const IMAGE_TYPES: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

/// Public URL prefix under which `uploads_dir` is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Both the file extension and the declared MIME type must name an image
/// type we serve.
pub fn is_allowed_image(file_name: &str, content_type: Option<&str>) -> bool {
    let ext_ok = extension(file_name).is_some_and(|e| IMAGE_TYPES.contains(&e.as_str()));
    let mime_ok = content_type
        .map(str::to_ascii_lowercase)
        .is_some_and(|m| IMAGE_TYPES.iter().any(|t| m.contains(t)));
    ext_ok && mime_ok
}

/// Writes `bytes` under a fresh `<unix-millis>-<random>.<ext>` name and
/// returns its public path.
pub async fn store_image(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<String> {
    tokio::fs::create_dir_all(dir).await?;
    let ext = extension(file_name).unwrap_or_default();
    let random = uuid::Uuid::new_v4().simple().to_string();
    let stored = format!("{}-{}.{}", Utc::now().timestamp_millis(), &random[..9], ext);

    tokio::fs::write(dir.join(&stored), bytes).await?;
    info!("Stored upload {} ({} bytes)", stored, bytes.len());
    Ok(format!("{PUBLIC_PREFIX}/{stored}"))
}

/// Removes an upload stored by [`store_image`], given its public path.
pub async fn discard(dir: &Path, public_path: &str) {
    let Some(name) = public_path
        .strip_prefix(PUBLIC_PREFIX)
        .map(|rest| rest.trim_start_matches('/'))
    else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(dir.join(name)).await {
        warn!("Failed to remove orphaned upload {}: {}", name, e);
    }
}

/// Reads an advertisement form, saving the optional `image` part.
///
/// On any error the already stored image is removed again.
pub async fn read_ad_form(
    multipart: Multipart,
    dir: &Path,
    max_bytes: usize,
) -> ServiceResult<(NewAdvertisement, Option<String>)> {
    let mut image = None;
    match read_fields(multipart, dir, max_bytes, &mut image).await {
        Ok(form) => Ok((form, image)),
        Err(e) => {
            if let Some(path) = image {
                discard(dir, &path).await;
            }
            Err(e)
        }
    }
}

async fn read_fields(
    mut multipart: Multipart,
    dir: &Path,
    max_bytes: usize,
    image: &mut Option<String>,
) -> ServiceResult<NewAdvertisement> {
    let mut form = NewAdvertisement::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Validation(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            if image.is_some() {
                return Err(ServiceError::Validation(
                    "Only one image may be uploaded".to_string(),
                ));
            }
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            if !is_allowed_image(&file_name, content_type.as_deref()) {
                warn!("Rejected upload {:?} ({:?})", file_name, content_type);
                return Err(ServiceError::Validation(
                    "Only images are allowed (jpeg, jpg, png, gif, webp)".to_string(),
                ));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::Validation(format!("Invalid image upload: {e}")))?;
            if bytes.len() > max_bytes {
                return Err(ServiceError::Validation(format!(
                    "Image is too large (limit {} bytes)",
                    max_bytes
                )));
            }
            let path = store_image(dir, &file_name, &bytes)
                .await
                .map_err(ServiceError::Upload)?;
            *image = Some(path);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ServiceError::Validation(format!("Invalid form data: {e}")))?;
        match name.as_str() {
            "title" => form.title = Some(value),
            "description" => form.description = Some(value),
            "link" => form.link = Some(value),
            "status" => form.status = Some(value),
            _ => {}
        }
    }

    Ok(form)
}
