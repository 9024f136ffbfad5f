//! Warehouse locations: hierarchy management and stock transfers
//!
//! Locations form a tree per company (warehouse > zone > shelf > bin). The
//! parent chain is walked before every reparenting so the tree stays acyclic.
//! Stock transfers between two locations are all-or-nothing: both counters
//! and the transfer ledger row commit together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{exceeds_capacity, LocationType, MovementType};
use shared::validation::{validate_capacity, validate_location_code, validate_transfer_quantity};

use crate::error::{AppError, AppResult};
use crate::services::movement::InventoryMovement;

/// Location service for warehouse hierarchy and transfers
#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
}

/// Warehouse location record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub code: String,
    pub location_type: LocationType,
    pub parent_id: Option<Uuid>,
    pub current_stock: i32,
    pub capacity: Option<i32>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a location
#[derive(Debug, Deserialize)]
pub struct CreateLocationInput {
    pub name: String,
    pub code: String,
    pub location_type: LocationType,
    pub parent_id: Option<Uuid>,
    pub capacity: Option<i32>,
    pub notes: Option<String>,
}

/// Input for updating a location.
///
/// `parent_id` is doubly optional: absent leaves the parent untouched,
/// explicit `null` moves the location to the root.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLocationInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

/// Distinguishes an absent field from an explicit `null`: this runs only when
/// the field is present, so `null` becomes `Some(None)` while a missing field
/// falls back to the `default` of `None`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

/// Input for transferring stock between two locations
#[derive(Debug, Deserialize)]
pub struct TransferStockInput {
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Result of a completed transfer
#[derive(Debug, Serialize)]
pub struct StockTransfer {
    pub movement: InventoryMovement,
    pub from_location: Location,
    pub to_location: Location,
}

const LOCATION_COLUMNS: &str = r#"
    id, company_id, name, code, location_type, parent_id,
    current_stock, capacity, is_active, notes, created_at, updated_at
"#;

impl LocationService {
    /// Create a new LocationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a location
    pub async fn create(
        &self,
        company_id: Uuid,
        input: CreateLocationInput,
    ) -> AppResult<Location> {
        validate_location_code(&input.code).map_err(|msg| AppError::Validation {
            field: "code".to_string(),
            message: msg.to_string(),
        })?;
        validate_capacity(input.capacity).map_err(|msg| AppError::Validation {
            field: "capacity".to_string(),
            message: msg.to_string(),
        })?;

        // Code is unique per company
        let code_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM locations WHERE company_id = $1 AND code = $2)",
        )
        .bind(company_id)
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;

        if code_taken {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        if let Some(parent_id) = input.parent_id {
            self.get(company_id, parent_id).await?;
        }

        let location = sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO locations (company_id, name, code, location_type, parent_id, capacity, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(company_id)
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.location_type)
        .bind(input.parent_id)
        .bind(input.capacity)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(location)
    }

    /// List all locations for a company
    pub async fn list(&self, company_id: Uuid) -> AppResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM locations WHERE company_id = $1 ORDER BY code",
            LOCATION_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(locations)
    }

    /// Get a location by id
    pub async fn get(&self, company_id: Uuid, location_id: Uuid) -> AppResult<Location> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM locations WHERE id = $1 AND company_id = $2",
            LOCATION_COLUMNS
        ))
        .bind(location_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Location".to_string()))
    }

    /// Update a location, walking the ancestor chain before any reparenting
    pub async fn update(
        &self,
        company_id: Uuid,
        location_id: Uuid,
        input: UpdateLocationInput,
    ) -> AppResult<Location> {
        let existing = self.get(company_id, location_id).await?;

        let parent_id = match input.parent_id {
            Some(new_parent) => {
                if let Some(parent_id) = new_parent {
                    if parent_id == location_id {
                        return Err(AppError::Validation {
                            field: "parent_id".to_string(),
                            message: "A location cannot be its own parent".to_string(),
                        });
                    }
                    self.get(company_id, parent_id).await?;
                    self.assert_no_cycle(company_id, location_id, parent_id)
                        .await?;
                }
                new_parent
            }
            None => existing.parent_id,
        };

        let name = input.name.unwrap_or(existing.name);
        let capacity = input.capacity.or(existing.capacity);
        let is_active = input.is_active.unwrap_or(existing.is_active);
        let notes = input.notes.or(existing.notes);

        validate_capacity(capacity).map_err(|msg| AppError::Validation {
            field: "capacity".to_string(),
            message: msg.to_string(),
        })?;

        // Capacity may not drop below what the location already holds
        if exceeds_capacity(existing.current_stock, 0, capacity) {
            return Err(AppError::CapacityExceeded(format!(
                "Location {} holds {} units, capacity cannot be lowered to {}",
                existing.code,
                existing.current_stock,
                capacity.unwrap_or(0)
            )));
        }

        let location = sqlx::query_as::<_, Location>(&format!(
            r#"
            UPDATE locations
            SET name = $1, parent_id = $2, capacity = $3, is_active = $4, notes = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        ))
        .bind(&name)
        .bind(parent_id)
        .bind(capacity)
        .bind(is_active)
        .bind(&notes)
        .bind(location_id)
        .fetch_one(&self.db)
        .await?;

        Ok(location)
    }

    /// Delete a location.
    ///
    /// Forbidden while the location has children or appears in the movement
    /// ledger as source or destination.
    pub async fn delete(&self, company_id: Uuid, location_id: Uuid) -> AppResult<()> {
        self.get(company_id, location_id).await?;

        let has_children = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM locations WHERE parent_id = $1)",
        )
        .bind(location_id)
        .fetch_one(&self.db)
        .await?;

        if has_children {
            return Err(AppError::Conflict {
                resource: "Location".to_string(),
                message: "Cannot delete a location with child locations".to_string(),
            });
        }

        let has_movements = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM inventory_movements
                WHERE from_location_id = $1 OR to_location_id = $1
            )
            "#,
        )
        .bind(location_id)
        .fetch_one(&self.db)
        .await?;

        if has_movements {
            return Err(AppError::Conflict {
                resource: "Location".to_string(),
                message: "Cannot delete a location referenced by inventory movements".to_string(),
            });
        }

        sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(location_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Move stock between two locations under capacity constraints.
    ///
    /// Both counters and the TRANSFER ledger row commit in one unit of work;
    /// the movement's previous/new stock track the source location.
    pub async fn transfer_stock(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: TransferStockInput,
    ) -> AppResult<StockTransfer> {
        validate_transfer_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        if input.from_location_id == input.to_location_id {
            return Err(AppError::Validation {
                field: "to_location_id".to_string(),
                message: "Source and destination locations must differ".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        // Lock both rows in id order so concurrent transfers cannot deadlock
        let locked = sqlx::query_as::<_, Location>(&format!(
            r#"
            SELECT {} FROM locations
            WHERE id = ANY($1) AND company_id = $2
            ORDER BY id
            FOR UPDATE
            "#,
            LOCATION_COLUMNS
        ))
        .bind(vec![input.from_location_id, input.to_location_id])
        .bind(company_id)
        .fetch_all(&mut *tx)
        .await?;

        let from = locked
            .iter()
            .find(|l| l.id == input.from_location_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Source location".to_string()))?;
        let to = locked
            .iter()
            .find(|l| l.id == input.to_location_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Destination location".to_string()))?;

        if !from.is_active {
            return Err(AppError::Validation {
                field: "from_location_id".to_string(),
                message: "Source location is inactive".to_string(),
            });
        }
        if !to.is_active {
            return Err(AppError::Validation {
                field: "to_location_id".to_string(),
                message: "Destination location is inactive".to_string(),
            });
        }

        if from.current_stock < input.quantity {
            return Err(AppError::InsufficientStock(format!(
                "Location {} holds {} units, cannot transfer {}",
                from.code, from.current_stock, input.quantity
            )));
        }

        if exceeds_capacity(to.current_stock, input.quantity, to.capacity) {
            return Err(AppError::CapacityExceeded(format!(
                "Location {} capacity {} would be exceeded ({} + {})",
                to.code,
                to.capacity.unwrap_or(0),
                to.current_stock,
                input.quantity
            )));
        }

        let from_new_stock = from.current_stock - input.quantity;
        let to_new_stock = to.current_stock + input.quantity;

        sqlx::query(
            "UPDATE locations SET current_stock = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(from_new_stock)
        .bind(from.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE locations SET current_stock = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(to_new_stock)
        .bind(to.id)
        .execute(&mut *tx)
        .await?;

        // Pure location-to-location transfer: no product linkage
        let movement = sqlx::query_as::<_, InventoryMovement>(
            r#"
            INSERT INTO inventory_movements (company_id, movement_type, reason, quantity,
                                             previous_stock, new_stock,
                                             from_location_id, to_location_id, notes, created_by)
            VALUES ($1, $2, 'transfer', $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, company_id, product_id, movement_type, reason, quantity,
                      previous_stock, new_stock, unit_cost, total_cost,
                      transaction_id, from_location_id, to_location_id,
                      notes, created_by, created_at
            "#,
        )
        .bind(company_id)
        .bind(MovementType::Transfer)
        .bind(input.quantity)
        .bind(from.current_stock)
        .bind(from_new_stock)
        .bind(from.id)
        .bind(to.id)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            from = %from.code,
            to = %to.code,
            quantity = input.quantity,
            "Transferred stock between locations"
        );

        let mut from_location = from;
        from_location.current_stock = from_new_stock;
        let mut to_location = to;
        to_location.current_stock = to_new_stock;

        Ok(StockTransfer {
            movement,
            from_location,
            to_location,
        })
    }

    /// Walk the ancestor chain of the proposed parent; fail if the location
    /// being moved (or any node already visited) appears in it.
    async fn assert_no_cycle(
        &self,
        company_id: Uuid,
        location_id: Uuid,
        new_parent_id: Uuid,
    ) -> AppResult<()> {
        let mut visited = std::collections::HashSet::new();
        let mut cursor = Some(new_parent_id);

        while let Some(current) = cursor {
            if current == location_id || !visited.insert(current) {
                return Err(AppError::CircularReference(format!(
                    "Moving location {} under {} would create a cycle",
                    location_id, new_parent_id
                )));
            }

            cursor = sqlx::query_scalar::<_, Option<Uuid>>(
                "SELECT parent_id FROM locations WHERE id = $1 AND company_id = $2",
            )
            .bind(current)
            .bind(company_id)
            .fetch_optional(&self.db)
            .await?
            .flatten();
        }

        Ok(())
    }
}
