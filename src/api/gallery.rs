use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::{parse_body, validate_required};
use super::{ApiError, ApiResponse, AppState, GalleryDto, GalleryImageDto};

const GALLERY_CACHE_CONTROL: &str = "public, max-age=31536000";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    #[serde(default)]
    pub image: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageEnvelope {
    pub image: GalleryImageDto,
}

/// POST /gallery
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UploadImageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ImageEnvelope>>), ApiError> {
    let payload = parse_body(payload)?;

    let image = validate_required("image", &payload.image)?;
    let url = state.image_host().upload(image).await?;

    let stored = state
        .store()
        .add_gallery_image(&url, payload.content_type.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Image uploaded",
            ImageEnvelope {
                image: stored.into(),
            },
        )),
    ))
}

/// GET /gallery
/// Hosted URLs never change, so clients may cache the listing for a year
pub async fn list_images(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let images = state.store().list_gallery_images().await?;

    let mut response = Json(ApiResponse::success(GalleryDto {
        images: images.into_iter().map(GalleryImageDto::from).collect(),
    }))
    .into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(GALLERY_CACHE_CONTROL),
    );

    Ok(response)
}
