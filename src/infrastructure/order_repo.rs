use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::OrderRepository;
use crate::schema::orders;

use super::models::OrderRow;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn find_by_order_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        row.map(Order::try_from).transpose()
    }

    fn save(&self, order: &Order) -> Result<Order, DomainError> {
        let row = OrderRow::try_from(order)?;
        let mut conn = self.pool.get()?;

        let stored = diesel::insert_into(orders::table)
            .values(&row)
            .on_conflict(orders::id)
            .do_update()
            .set(&row)
            .returning(OrderRow::as_returning())
            .get_result(&mut conn)?;

        Order::try_from(stored)
    }

    fn delete_by_order_id(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::delete(orders::table.filter(orders::id.eq(id))).execute(&mut conn)?;
        Ok(())
    }

    fn delete_inserted_before(
        &self,
        inserted_before: DateTime<Utc>,
        updated_before: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        let removed = diesel::delete(
            orders::table
                .filter(orders::inserted_at.lt(inserted_before))
                .filter(orders::updated_at.lt(updated_before)),
        )
        .execute(&mut conn)?;

        Ok(removed)
    }
}
