use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{CustomerInfo, DeliveryInfo, Order};
use crate::schema::orders;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub products: Value,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub customer_email: String,
    pub customer_phone_number: String,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_postal_code: String,
    pub delivery_country: String,
    pub paid: bool,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Order> for OrderRow {
    type Error = DomainError;

    fn try_from(order: &Order) -> Result<Self, Self::Error> {
        let products = serde_json::to_value(&order.products)
            .map_err(|e| DomainError::Storage(format!("cannot encode products: {e}")))?;
        Ok(OrderRow {
            id: order.order_id,
            products,
            customer_first_name: order.customer_info.first_name.clone(),
            customer_last_name: order.customer_info.last_name.clone(),
            customer_email: order.customer_info.email.clone(),
            customer_phone_number: order.customer_info.phone_number.clone(),
            delivery_address: order.delivery_info.address.clone(),
            delivery_city: order.delivery_info.city.clone(),
            delivery_postal_code: order.delivery_info.postal_code.clone(),
            delivery_country: order.delivery_info.country.clone(),
            paid: order.paid,
            inserted_at: order.insert_date_time,
            updated_at: order.updated_at,
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let products = serde_json::from_value(row.products).map_err(|e| {
            DomainError::Storage(format!("corrupt products for order {}: {e}", row.id))
        })?;
        Ok(Order {
            order_id: row.id,
            products,
            customer_info: CustomerInfo {
                first_name: row.customer_first_name,
                last_name: row.customer_last_name,
                email: row.customer_email,
                phone_number: row.customer_phone_number,
            },
            delivery_info: DeliveryInfo {
                address: row.delivery_address,
                city: row.delivery_city,
                postal_code: row.delivery_postal_code,
                country: row.delivery_country,
            },
            paid: row.paid,
            insert_date_time: row.inserted_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::fixtures;

    #[test]
    fn row_conversion_preserves_every_field() {
        let order = fixtures::order();

        let row = OrderRow::try_from(&order).expect("encodes");
        assert_eq!(row.customer_email, "joedoe@test.com");
        assert_eq!(row.delivery_country, "United Kingdom");

        let back = Order::try_from(row).expect("decodes");
        assert_eq!(back, order);
    }

    #[test]
    fn corrupt_products_column_is_a_storage_error() {
        let mut row = OrderRow::try_from(&fixtures::order()).expect("encodes");
        row.products = serde_json::json!({"not": "a list"});

        let err = Order::try_from(row).expect_err("must not decode");
        assert!(matches!(err, DomainError::Storage(_)));
    }
}
