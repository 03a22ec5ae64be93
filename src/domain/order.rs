use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Current UTC time at the precision the store keeps (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub reviewer_name: String,
    #[serde(default)]
    pub comment: String,
    pub rating: i32,
    #[serde(default)]
    pub review_date: Option<NaiveDateTime>,
}

/// Product snapshot as published by the shopping service. Copied verbatim
/// into orders; categories are kept as the upstream names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String, example = "9.99")]
    pub price: BigDecimal,
    #[serde(default)]
    pub manufacturer: Option<Manufacturer>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShoppingCart {
    pub id: Uuid,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: Uuid,
    pub products: Vec<Product>,
    pub customer_info: CustomerInfo,
    pub delivery_info: DeliveryInfo,
    pub paid: bool,
    pub insert_date_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Snapshot a cart into a new, unpaid order with a fresh id.
    pub fn from_cart(
        cart: ShoppingCart,
        customer_info: CustomerInfo,
        delivery_info: DeliveryInfo,
    ) -> Self {
        let created = now();
        Self {
            order_id: Uuid::new_v4(),
            products: cart.products,
            customer_info,
            delivery_info,
            paid: false,
            insert_date_time: created,
            updated_at: created,
        }
    }

    /// Applies the payment transition. Returns `false` when the order was
    /// already paid, in which case nothing changes.
    pub fn mark_paid(&mut self) -> bool {
        if self.paid {
            return false;
        }
        self.paid = true;
        self.updated_at = now();
        true
    }
}

/// One element of a bulk-import document. Identifiers and timestamps in the
/// payload are not part of the record and are dropped during decoding.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub delivery_info: DeliveryInfo,
    #[serde(default)]
    pub paid: bool,
}

impl OrderRecord {
    pub fn into_order(self) -> Order {
        let inserted = now();
        Order {
            order_id: Uuid::new_v4(),
            products: self.products,
            customer_info: self.customer_info,
            delivery_info: self.delivery_info,
            paid: self.paid,
            insert_date_time: inserted,
            updated_at: inserted,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::str::FromStr;

    use super::*;

    pub fn customer() -> CustomerInfo {
        CustomerInfo {
            first_name: "Joe".to_string(),
            last_name: "Doe".to_string(),
            email: "joedoe@test.com".to_string(),
            phone_number: "555666777".to_string(),
        }
    }

    pub fn delivery() -> DeliveryInfo {
        DeliveryInfo {
            address: "Street 1".to_string(),
            city: "London".to_string(),
            postal_code: "33333".to_string(),
            country: "United Kingdom".to_string(),
        }
    }

    pub fn product(name: &str, price: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: "Test description".to_string(),
            price: BigDecimal::from_str(price).expect("valid decimal"),
            manufacturer: Some(Manufacturer {
                id: Uuid::new_v4(),
                name: "manufacturer name".to_string(),
                address: "address".to_string(),
                contact: "contact".to_string(),
            }),
            categories: vec!["BABY_PRODUCTS".to_string()],
            created_at: None,
            updated_at: None,
            reviews: vec![Review {
                reviewer_name: "Name".to_string(),
                comment: "Comment".to_string(),
                rating: 5,
                review_date: None,
            }],
        }
    }

    pub fn cart(products: Vec<Product>) -> ShoppingCart {
        ShoppingCart {
            id: Uuid::new_v4(),
            products,
        }
    }

    pub fn order() -> Order {
        Order::from_cart(
            cart(vec![product("Test product", "10")]),
            customer(),
            delivery(),
        )
    }
}
