use axum::{
    extract::{Multipart, Path, Query, State},
    response::Json,
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::{ApiData, ApiMessage, AppState};
use crate::auth::{authorize, Action, CurrentUser};
use crate::error::ApiError;
use crate::models::{
    CreateServicePayload, Service, ServiceImage, ServiceListQuery, UpdateServicePayload,
};
use crate::services::image_storage::{ALLOWED_IMAGE_EXTENSIONS, MAX_IMAGE_BYTES};

/// Fields accepted by the create/update service forms. Submitted as
/// multipart so the image can ride along as a file; `image_url` is the
/// alternative for externally hosted images.
#[derive(Debug, Default)]
struct ServiceForm {
    name: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    duration_minutes: Option<i32>,
    category: Option<String>,
    is_active: Option<bool>,
    image_url: Option<String>,
    upload: Option<(String, Vec<u8>)>,
}

impl ServiceForm {
    fn image(self) -> (Option<ServiceImage>, Self) {
        // An uploaded file wins over a URL when both are submitted.
        if let Some((extension, data)) = self.upload.clone() {
            return (Some(ServiceImage::Upload { extension, data }), self);
        }
        if let Some(url) = self.image_url.clone() {
            return (Some(ServiceImage::ExternalUrl(url)), self);
        }
        (None, self)
    }
}

async fn read_service_form(mut multipart: Multipart) -> Result<ServiceForm, ApiError> {
    let mut form = ServiceForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::bad_request(format!("Malformed form data: {error}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        if field_name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let extension = file_name
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();

            if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
                return Err(ApiError::bad_request(
                    "The image must be a file of type: jpeg, png, jpg, gif.",
                ));
            }

            let data = field
                .bytes()
                .await
                .map_err(|error| ApiError::bad_request(format!("Malformed form data: {error}")))?;

            if data.len() > MAX_IMAGE_BYTES {
                return Err(ApiError::bad_request(
                    "The image may not be greater than 2048 kilobytes.",
                ));
            }

            form.upload = Some((extension, data.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|error| ApiError::bad_request(format!("Malformed form data: {error}")))?;

        match field_name.as_str() {
            "name" => form.name = Some(value),
            "description" => form.description = Some(value),
            "price" => {
                form.price = Some(value.parse().map_err(|_| {
                    ApiError::bad_request("The price must be a number.")
                })?);
            }
            "duration" | "duration_minutes" => {
                form.duration_minutes = Some(value.parse().map_err(|_| {
                    ApiError::bad_request("The duration must be an integer.")
                })?);
            }
            "category" => form.category = Some(value),
            "is_active" => {
                form.is_active = Some(matches!(value.as_str(), "true" | "1" | "on"));
            }
            "image_url" => form.image_url = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

/// List services. Regular users only see active entries; admins see all.
#[tracing::instrument(skip(state, caller))]
pub async fn list_services(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Query(query): Query<ServiceListQuery>,
) -> Result<Json<ApiData<Vec<Service>>>, ApiError> {
    let only_active = caller.is_user();
    let services = state
        .catalog
        .list(only_active, query.category.as_deref())
        .await?;

    Ok(Json(ApiData::new(
        "Services retrieved successfully",
        services,
    )))
}

#[tracing::instrument(skip(state, caller))]
pub async fn get_service(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<ApiData<Service>>, ApiError> {
    let service = state.catalog.get(service_id).await?;

    if caller.is_user() && !service.is_active {
        return Err(ApiError::NotFound("Service"));
    }

    Ok(Json(ApiData::new("Service retrieved successfully", service)))
}

/// Create a service (admin only).
#[tracing::instrument(skip(state, caller, multipart))]
pub async fn create_service(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiData<Service>>, ApiError> {
    authorize(&caller, Action::ManageServices)?;

    let form = read_service_form(multipart).await?;
    let (image, form) = form.image();

    let payload = CreateServicePayload {
        name: form
            .name
            .ok_or_else(|| ApiError::bad_request("The name field is required."))?,
        description: form
            .description
            .ok_or_else(|| ApiError::bad_request("The description field is required."))?,
        price: form
            .price
            .ok_or_else(|| ApiError::bad_request("The price field is required."))?,
        duration_minutes: form
            .duration_minutes
            .ok_or_else(|| ApiError::bad_request("The duration field is required."))?,
        category: form
            .category
            .ok_or_else(|| ApiError::bad_request("The category field is required."))?,
        is_active: form.is_active,
    };
    payload.validate()?;

    let service = state.catalog.create(payload, image).await?;
    Ok(Json(ApiData::new("Service created successfully", service)))
}

/// Update a service (admin only). All fields optional; a new uploaded
/// image replaces and deletes the previous stored file.
#[tracing::instrument(skip(state, caller, multipart))]
pub async fn update_service(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(service_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiData<Service>>, ApiError> {
    authorize(&caller, Action::ManageServices)?;

    let form = read_service_form(multipart).await?;
    let (image, form) = form.image();

    let payload = UpdateServicePayload {
        name: form.name,
        description: form.description,
        price: form.price,
        duration_minutes: form.duration_minutes,
        category: form.category,
        is_active: form.is_active,
    };
    payload.validate()?;

    let service = state.catalog.update(service_id, payload, image).await?;
    Ok(Json(ApiData::new("Service updated successfully", service)))
}

/// Delete a service (admin only). Removes the stored image file unless the
/// image value is an external URL.
#[tracing::instrument(skip(state, caller))]
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    authorize(&caller, Action::ManageServices)?;

    state.catalog.delete(service_id).await?;
    Ok(Json(ApiMessage::new("Service deleted successfully")))
}
