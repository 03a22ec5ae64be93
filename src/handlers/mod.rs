pub mod orders;
pub mod validation;

use actix_web::web;
use utoipa::OpenApi;

use crate::domain::order::{
    CustomerInfo, DeliveryInfo, Manufacturer, Order, OrderRecord, Product, Review,
};
use crate::errors::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::get_order,
        orders::delete_order,
        orders::finalize_order,
        orders::upload_orders,
    ),
    components(schemas(
        Order,
        OrderRecord,
        Product,
        Manufacturer,
        Review,
        CustomerInfo,
        DeliveryInfo,
        orders::CreateOrderRequest,
        orders::PaymentRequest,
        orders::ImportOrdersResponse,
        orders::ImportFailure,
        orders::UploadForm,
    )),
    tags((name = "orders", description = "Order creation, payment and bulk import"))
)]
pub struct ApiDoc;

/// Registers the `/order` routes and the extractor configs that turn
/// malformed ids and bodies into 400 responses.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/order")
            // Must precede "/{id}" so "upload" is not parsed as an id.
            .route("/upload", web::post().to(orders::upload_orders))
            .route("/{id}", web::post().to(orders::create_order))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}", web::delete().to(orders::delete_order))
            .route("/{id}/finalize", web::post().to(orders::finalize_order)),
    );
}
