use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{CreateServicePayload, Service, ServiceImage, UpdateServicePayload};
use crate::services::image_storage::{is_external_url, ImageStorage};

/// Image values that point at a file this service stored, as opposed to an
/// external URL kept verbatim. Only these are ever deleted from disk.
fn locally_stored(image: Option<&str>) -> Option<&str> {
    image.filter(|value| !is_external_url(value))
}

/// Service catalog CRUD. Writes are admin-only (enforced by the policy
/// gate in the handlers); reads hide inactive services from regular users.
#[derive(Debug, Clone)]
pub struct CatalogService {
    db: PgPool,
    storage: ImageStorage,
}

impl CatalogService {
    pub fn new(db: PgPool, storage: ImageStorage) -> Self {
        Self { db, storage }
    }

    pub async fn list(
        &self,
        only_active: bool,
        category: Option<&str>,
    ) -> Result<Vec<Service>, ApiError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services
             WHERE ($1::text IS NULL OR category = $1)
               AND (is_active OR NOT $2)
             ORDER BY name",
        )
        .bind(category)
        .bind(only_active)
        .fetch_all(&self.db)
        .await?;

        Ok(services)
    }

    pub async fn get(&self, service_id: Uuid) -> Result<Service, ApiError> {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(service_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ApiError::NotFound("Service"))?;

        Ok(service)
    }

    pub async fn create(
        &self,
        payload: CreateServicePayload,
        image: Option<ServiceImage>,
    ) -> Result<Service, ApiError> {
        let image_value = self.resolve_image(image).await?;

        let inserted = sqlx::query_as::<_, Service>(
            "INSERT INTO services (id, name, description, price, duration_minutes, category, image, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(payload.duration_minutes)
        .bind(&payload.category)
        .bind(&image_value)
        .bind(payload.is_active.unwrap_or(true))
        .fetch_one(&self.db)
        .await;

        match inserted {
            Ok(service) => Ok(service),
            Err(error) => {
                self.discard_stored_file(image_value.as_deref()).await;
                Err(error.into())
            }
        }
    }

    pub async fn update(
        &self,
        service_id: Uuid,
        payload: UpdateServicePayload,
        image: Option<ServiceImage>,
    ) -> Result<Service, ApiError> {
        let existing = self.get(service_id).await?;

        let new_image = self.resolve_image(image).await?;

        let updated = sqlx::query_as::<_, Service>(
            "UPDATE services
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 price = COALESCE($4, price),
                 duration_minutes = COALESCE($5, duration_minutes),
                 category = COALESCE($6, category),
                 is_active = COALESCE($7, is_active),
                 image = COALESCE($8, image),
                 updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(service_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(payload.duration_minutes)
        .bind(&payload.category)
        .bind(payload.is_active)
        .bind(&new_image)
        .fetch_one(&self.db)
        .await;

        let service = match updated {
            Ok(service) => service,
            Err(error) => {
                // A failed row update must not leave the new file orphaned.
                self.discard_stored_file(new_image.as_deref()).await;
                return Err(error.into());
            }
        };

        // A replaced stored file is removed once the row points elsewhere.
        if new_image.is_some() {
            self.discard_stored_file(existing.image.as_deref()).await;
        }

        Ok(service)
    }

    pub async fn delete(&self, service_id: Uuid) -> Result<(), ApiError> {
        let service = self.get(service_id).await?;

        sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(service_id)
            .execute(&self.db)
            .await
            .map_err(|error| match error.as_database_error() {
                Some(db_error)
                    if matches!(
                        db_error.kind(),
                        sqlx::error::ErrorKind::ForeignKeyViolation
                    ) =>
                {
                    ApiError::policy("Service has bookings and cannot be deleted.")
                }
                _ => ApiError::Database(error),
            })?;

        self.discard_stored_file(service.image.as_deref()).await;

        Ok(())
    }

    /// Remove a stored image file, ignoring external URLs. Failures are
    /// logged; the row change already happened.
    async fn discard_stored_file(&self, image: Option<&str>) {
        if let Some(path) = locally_stored(image) {
            if let Err(error) = self.storage.delete(path).await {
                tracing::warn!(%error, path, "failed to delete stored image");
            }
        }
    }

    async fn resolve_image(
        &self,
        image: Option<ServiceImage>,
    ) -> Result<Option<String>, ApiError> {
        match image {
            Some(ServiceImage::Upload { extension, data }) => {
                let path = self.storage.store(&extension, &data).await?;
                Ok(Some(path))
            }
            Some(ServiceImage::ExternalUrl(url)) => Ok(Some(url)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_stored_paths_are_ever_deleted() {
        assert_eq!(
            locally_stored(Some("services/abc.png")),
            Some("services/abc.png")
        );
        assert_eq!(locally_stored(Some("https://example.com/abc.png")), None);
        assert_eq!(locally_stored(Some("http://example.com/abc.png")), None);
        assert_eq!(locally_stored(None), None);
    }

    #[tokio::test]
    async fn failed_write_discards_the_fresh_upload() {
        let dir = std::env::temp_dir().join(format!("catalog-{}", Uuid::new_v4()));
        let storage = ImageStorage::new(&dir);

        let path = storage.store("png", b"image bytes").await.unwrap();
        assert!(dir.join(&path).exists());

        // Emulate the error path: the stored file is discarded, an external
        // URL would be left alone.
        let service = CatalogService::new(
            sqlx::postgres::PgPoolOptions::new().connect_lazy("postgresql://localhost").unwrap(),
            storage,
        );
        service.discard_stored_file(Some(&path)).await;
        assert!(!dir.join(&path).exists());

        service
            .discard_stored_file(Some("https://example.com/abc.png"))
            .await;

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
