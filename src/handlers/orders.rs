use std::fmt;
use std::pin::pin;

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::web::{self, Bytes};
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::domain::order::{CustomerInfo, DeliveryInfo, Order};
use crate::errors::AppError;

use super::validation::Validate;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub delivery_info: DeliveryInfo,
}

/// Card details sent with a finalize call. Only checked for shape; the
/// values are never stored or logged.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_month: String,
    #[serde(default)]
    pub expiry_year: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub card_holder: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportFailure {
    /// Position of the record in the uploaded array.
    pub index: usize,
    pub error: String,
}

/// Multipart body of an upload.
#[derive(ToSchema)]
pub struct UploadForm {
    /// JSON array of order records.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

const FILE_PART: &str = "file";

/// Largest upload document accepted, registered as app data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimit(pub usize);

impl Default for UploadLimit {
    fn default() -> Self {
        Self(4 * 1024 * 1024)
    }
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ImportOrdersResponse {
    pub orders: Vec<Order>,
    pub failures: Vec<ImportFailure>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /order/{cart_id}
///
/// Creates an order from the products currently in the shopping cart.
#[utoipa::path(
    post,
    path = "/order/{cart_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Shopping cart UUID"),
    ),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Invalid customer or delivery info"),
        (status = 404, description = "Shopping cart not found"),
        (status = 502, description = "Shopping service unavailable"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();
    let body = body.into_inner();
    body.validate()?;

    let order = service
        .create_order(cart_id, body.customer_info, body.delivery_info)
        .await?;

    Ok(HttpResponse::Created().json(order))
}

/// GET /order/{id}
#[utoipa::path(
    get,
    path = "/order/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 400, description = "Malformed order id"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order = service.retrieve_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// DELETE /order/{id}
#[utoipa::path(
    delete,
    path = "/order/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 400, description = "Malformed order id"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    service.delete_order(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /order/{id}/finalize
///
/// Marks the order as paid. Finalizing an already paid order returns it
/// unchanged.
#[utoipa::path(
    post,
    path = "/order/{id}/finalize",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Order paid", body = Order),
        (status = 400, description = "Invalid payment details"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn finalize_order(
    service: web::Data<OrderService>,
    path: web::Path<Uuid>,
    body: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let order = service.finalize_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// POST /order/upload
///
/// Imports a JSON array of orders sent as the `file` part of a multipart
/// form, or directly as the request body. Every record gets a new id and
/// insertion time. Responds 207 when only some records could be saved.
#[utoipa::path(
    post,
    path = "/order/upload",
    request_body(
        content = UploadForm,
        description = "Multipart form whose `file` part is a JSON array of order records. \
                       A bare JSON array sent as `application/json` is accepted too.",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "All records imported", body = ImportOrdersResponse),
        (status = 207, description = "Some records failed", body = ImportOrdersResponse),
        (status = 400, description = "Payload is not a JSON array of orders"),
        (status = 413, description = "Upload exceeds the size limit"),
        (status = 500, description = "No record could be saved"),
    ),
    tag = "orders"
)]
pub async fn upload_orders(
    service: web::Data<OrderService>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let UploadLimit(limit) = req.app_data::<UploadLimit>().copied().unwrap_or_default();
    let document = if req.content_type() == "multipart/form-data" {
        read_file_part(Multipart::new(req.headers(), payload), limit).await?
    } else {
        read_limited(payload, limit).await?
    };

    let mut saves = service.import_orders(&document)?.enumerate();

    let mut response = ImportOrdersResponse::default();
    let mut first_error = None;
    while let Some((index, result)) = saves.next().await {
        match result {
            Ok(order) => response.orders.push(order),
            Err(e) => {
                response.failures.push(ImportFailure {
                    index,
                    error: e.kind().to_string(),
                });
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        None => Ok(HttpResponse::Ok().json(response)),
        Some(e) if response.orders.is_empty() => Err(e.into()),
        Some(_) => Ok(HttpResponse::build(StatusCode::MULTI_STATUS).json(response)),
    }
}

async fn read_file_part(form: Multipart, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut form = pin!(form);
    while let Some(field) = form.next().await {
        let field = field.map_err(|e| AppError::BadRequest(e.to_string()))?;
        if field.name() == Some(FILE_PART) {
            return read_limited(field, limit).await;
        }
        read_limited(field, limit).await?;
    }
    Err(AppError::BadRequest(format!(
        "multipart upload has no '{FILE_PART}' part"
    )))
}

async fn read_limited<S, E>(body: S, limit: usize) -> Result<Vec<u8>, AppError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: fmt::Display,
{
    let mut body = pin!(body);
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
        if buf.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "upload exceeds {limit} bytes"
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
