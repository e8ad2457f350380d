use anyhow::Result;
use sqlx::PgPool;

use crate::auth::UserRole;
use crate::models::CreateUser;
use crate::services::UserService;

/// Idempotent startup seeding: the admin account, a demo user and the
/// starter catalog. Existing rows are left untouched.
pub struct DatabaseSeeder {
    pool: PgPool,
}

impl DatabaseSeeder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn seed_all(&self) -> Result<()> {
        tracing::info!("Starting database seeding...");

        self.seed_users().await?;
        self.seed_services().await?;

        tracing::info!("Database seeding completed!");
        Ok(())
    }

    async fn seed_users(&self) -> Result<()> {
        let user_service = UserService::new(self.pool.clone());

        // Admins are never self-registered; the one admin account comes
        // from here, pre-verified.
        if user_service
            .get_user_by_email("admin@service.com")
            .await?
            .is_none()
        {
            let admin = user_service
                .create_user(CreateUser {
                    name: "Admin User".to_string(),
                    email: "admin@service.com".to_string(),
                    password: "password".to_string(),
                    phone: Some("+1234567890".to_string()),
                    role: UserRole::Admin,
                })
                .await?;
            user_service.mark_email_verified(admin.id).await?;
            tracing::info!("Created admin user");
        }

        if user_service
            .get_user_by_email("user@service.com")
            .await?
            .is_none()
        {
            user_service
                .create_user(CreateUser {
                    name: "Test User".to_string(),
                    email: "user@service.com".to_string(),
                    password: "password".to_string(),
                    phone: Some("+1234567891".to_string()),
                    role: UserRole::User,
                })
                .await?;
            tracing::info!("Created test user");
        }

        Ok(())
    }

    async fn seed_services(&self) -> Result<()> {
        let services = [
            (
                "House Cleaning",
                "Professional house cleaning service including all rooms, kitchen, and bathrooms.",
                89.99,
                120,
                "Cleaning",
            ),
            (
                "Plumbing Repair",
                "Expert plumbing services for leaks, installations, and repairs.",
                125.00,
                90,
                "Maintenance",
            ),
            (
                "Electrical Installation",
                "Safe and certified electrical installation and repair services.",
                150.00,
                180,
                "Maintenance",
            ),
            (
                "Garden Landscaping",
                "Complete garden design and landscaping services for your outdoor space.",
                299.99,
                480,
                "Landscaping",
            ),
            (
                "AC Maintenance",
                "Air conditioning cleaning, maintenance, and repair services.",
                75.00,
                60,
                "Maintenance",
            ),
        ];

        for (name, description, price, duration_minutes, category) in services {
            let inserted = sqlx::query(
                "INSERT INTO services (name, description, price, duration_minutes, category, is_active)
                 VALUES ($1, $2, $3, $4, $5, TRUE)
                 ON CONFLICT (name) DO NOTHING",
            )
            .bind(name)
            .bind(description)
            .bind(price)
            .bind(duration_minutes)
            .bind(category)
            .execute(&self.pool)
            .await?;

            if inserted.rows_affected() > 0 {
                tracing::info!(service = name, "Created seed service");
            }
        }

        Ok(())
    }
}
