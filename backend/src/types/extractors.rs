//! Custom extractors for request validation

use aide::operation::OperationInput;
use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::StatusCode,
};
use validator::Validate;

use crate::types::{
    error::FieldErrors,
    image::{ImageFormat, MAX_IMAGE_BYTES},
    AppError,
};

/// Multipart field carrying the plant image
const IMAGE_FIELD: &str = "image";

/// Text fields of the plant upload form, after trimming
#[derive(Debug, Default, Validate)]
struct PlantUploadFields {
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    name: Option<String>,

    #[validate(
        required(message = "The description field is required."),
        length(
            max = 255,
            message = "The description field must not be greater than 255 characters."
        )
    )]
    description: Option<String>,

    #[validate(
        required(message = "The conseil entretien field is required."),
        length(
            max = 255,
            message = "The conseil entretien field must not be greater than 255 characters."
        )
    )]
    care_advice: Option<String>,
}

/// Image part as received, before validation
#[derive(Debug)]
struct RawImage {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// A validated plant image
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Format detected from the content
    pub format: ImageFormat,
    /// Raw file content
    pub bytes: Vec<u8>,
}

/// A validated plant upload
#[derive(Debug, Clone)]
pub struct PlantUpload {
    pub name: String,
    pub description: String,
    pub care_advice: String,
    pub image: ImageUpload,
}

/// Multipart extractor that validates the plant upload form
///
/// Accepts `name` (or `nom`), `description`, `conseil_entretien` (or `care_advice`) and an
/// `image` file. Every problem is reported at once as a `422` with per-field messages.
pub struct ValidatedPlantUpload(pub PlantUpload);

impl<S> FromRequest<S> for ValidatedPlantUpload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await.map_err(|_| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                "invalid_content_type",
                "Request body must be multipart/form-data",
                false,
            )
        })?;

        let mut fields = PlantUploadFields::default();
        let mut image = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            match name.as_str() {
                "name" | "nom" => {
                    fields.name = non_blank(field.text().await.map_err(multipart_error)?);
                }
                "description" => {
                    fields.description = non_blank(field.text().await.map_err(multipart_error)?);
                }
                "conseil_entretien" | "care_advice" => {
                    fields.care_advice = non_blank(field.text().await.map_err(multipart_error)?);
                }
                IMAGE_FIELD => {
                    let file_name = field.file_name().map(ToString::to_string);
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    image = Some(RawImage {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                other => tracing::debug!("Ignoring unknown form field: {other}"),
            }
        }

        let mut errors = FieldErrors::new();

        if let Err(validation_errors) = fields.validate() {
            for (field, field_errors) in validation_errors.field_errors() {
                errors.entry(wire_name(&field).to_string()).or_default().extend(
                    field_errors.iter().map(|error| {
                        error
                            .message
                            .as_ref()
                            .map_or_else(|| error.code.to_string(), ToString::to_string)
                    }),
                );
            }
        }

        let image = match validate_image(image) {
            Ok(image) => Some(image),
            Err(messages) => {
                errors.insert(IMAGE_FIELD.to_string(), messages);
                None
            }
        };

        match (fields, image) {
            (
                PlantUploadFields {
                    name: Some(name),
                    description: Some(description),
                    care_advice: Some(care_advice),
                },
                Some(image),
            ) if errors.is_empty() => Ok(Self(PlantUpload {
                name,
                description,
                care_advice,
                image,
            })),
            _ => Err(AppError::validation(errors)),
        }
    }
}

impl OperationInput for ValidatedPlantUpload {
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        Multipart::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        <AppError as aide::OperationOutput>::inferred_responses(ctx, operation)
    }
}

/// Field name as sent by clients
fn wire_name(field: &str) -> &str {
    match field {
        "care_advice" => "conseil_entretien",
        other => other,
    }
}

/// Trims a text field, treating blank input as missing
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn image_too_large() -> String {
    format!(
        "The image field must not be greater than {} kilobytes.",
        MAX_IMAGE_BYTES / 1024
    )
}

fn validate_image(image: Option<RawImage>) -> Result<ImageUpload, Vec<String>> {
    let Some(image) = image else {
        return Err(vec!["The image field is required.".to_string()]);
    };

    let mut messages = Vec::new();

    let format = ImageFormat::sniff(&image.bytes);
    if format.is_none() {
        tracing::debug!(file_name = ?image.file_name, "Upload is not a supported image");
        messages.push("The image field must be an image.".to_string());
        messages.push(format!(
            "The image field must be a file of type: {}.",
            ImageFormat::ALLOWED_EXTENSIONS
        ));
    }

    if image.bytes.len() > MAX_IMAGE_BYTES {
        messages.push(image_too_large());
    }

    match format {
        Some(format) if messages.is_empty() => Ok(ImageUpload {
            format,
            bytes: image.bytes,
        }),
        _ => Err(messages),
    }
}

/// Maps multipart stream failures, reporting an oversized body as an image size error
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let mut errors = FieldErrors::new();
        errors.insert(IMAGE_FIELD.to_string(), vec![image_too_large()]);
        return AppError::validation(errors);
    }

    AppError::new(
        StatusCode::BAD_REQUEST,
        "invalid_multipart",
        format!("Malformed multipart body: {}", err.body_text()),
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(len: usize) -> Vec<u8> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.resize(len, 0);
        bytes
    }

    #[test]
    fn test_missing_image_is_required() {
        assert_eq!(
            validate_image(None).unwrap_err(),
            vec!["The image field is required.".to_string()]
        );
    }

    #[test]
    fn test_image_at_limit_is_accepted() {
        let image = validate_image(Some(RawImage {
            file_name: Some("basil.png".to_string()),
            bytes: png(MAX_IMAGE_BYTES),
        }))
        .unwrap();

        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.bytes.len(), MAX_IMAGE_BYTES);
    }

    #[test]
    fn test_image_over_limit_is_rejected() {
        let messages = validate_image(Some(RawImage {
            file_name: Some("basil.png".to_string()),
            bytes: png(MAX_IMAGE_BYTES + 1),
        }))
        .unwrap_err();

        assert_eq!(
            messages,
            vec!["The image field must not be greater than 2048 kilobytes.".to_string()]
        );
    }

    #[test]
    fn test_non_image_is_rejected() {
        let messages = validate_image(Some(RawImage {
            file_name: Some("notes.pdf".to_string()),
            bytes: b"%PDF-1.4\n".to_vec(),
        }))
        .unwrap_err();

        assert_eq!(messages.len(), 2);
        assert!(messages[1].ends_with("jpeg, png, jpg, gif, svg."));
    }

    #[test]
    fn test_text_fields_validation() {
        let fields = PlantUploadFields {
            name: Some("x".repeat(256)),
            description: None,
            care_advice: Some("é".repeat(255)),
        };

        let errors = fields.validate().unwrap_err();
        let field_errors = errors.field_errors();

        assert_eq!(field_errors.len(), 2);
        assert!(field_errors.keys().any(|field| &**field == "name"));
        assert!(field_errors.keys().any(|field| &**field == "description"));
    }

    #[test]
    fn test_non_blank_trims() {
        assert_eq!(non_blank("  Basil \n".to_string()), Some("Basil".to_string()));
        assert_eq!(non_blank("   ".to_string()), None);
    }
}
