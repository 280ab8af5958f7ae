use axum::{
    Json,
    extract::{Multipart, State},
};

use crate::{
    error::{AppError, IMAGE_FAILED},
    message::ImageResponse,
    services::turn_processor::ImageUpload,
    state::SharedState,
};

const MISSING_FIELDS: &str = "Se requiere el ID de la sesión y una imagen.";

/// POST /api/upload-image
///
/// Multipart body with an `image` file field and a `sessionId` text field,
/// in either order.
pub async fn upload_image_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<ImageResponse>, AppError> {
    let mut session_id: Option<String> = None;
    let mut upload: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("sessionId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read sessionId: {e}")))?;
                session_id = Some(text);
            }
            Some(field_name @ "image") => {
                let field_name = field_name.to_string();
                let mime_type = field
                    .content_type()
                    .map(str::to_string)
                    .or_else(|| guess_mime(field.file_name()))
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read image: {e}")))?;
                upload = Some(ImageUpload { field_name, bytes: bytes.to_vec(), mime_type });
            }
            _ => {}
        }
    }

    let (Some(session_id), Some(upload)) = (session_id, upload) else {
        return Err(AppError::BadRequest(MISSING_FIELDS.to_string()));
    };

    let reply = state
        .turns
        .handle_image(&session_id, upload)
        .await
        .map_err(|e| AppError::from_turn(e, IMAGE_FAILED))?;

    Ok(Json(ImageResponse { message: reply.message, image_url: reply.image_url }))
}

// Some clients omit the part's Content-Type; fall back to the filename.
fn guess_mime(file_name: Option<&str>) -> Option<String> {
    mime_guess::from_path(file_name?)
        .first()
        .map(|m| m.essence_str().to_string())
}
