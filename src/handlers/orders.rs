use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::order::{CreateOrderInput, OrderItemInput};
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub selected_size: String,
    #[serde(default)]
    pub selected_color: String,
    pub quantity: i32,
    /// Decimal price, either a JSON number or a string such as "9.99"
    #[schema(value_type = String)]
    pub unit_price: BigDecimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub delivery_method: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub comment: String,
    pub items: Vec<CreateOrderItemRequest>,
}

impl From<CreateOrderRequest> for CreateOrderInput {
    fn from(req: CreateOrderRequest) -> Self {
        CreateOrderInput {
            user_id: req.user_id,
            payment_method: req.payment_method,
            delivery_method: req.delivery_method,
            delivery_address: req.delivery_address,
            comment: req.comment,
            items: req
                .items
                .into_iter()
                .map(|i| OrderItemInput {
                    product_id: i.product_id,
                    product_name: i.product_name,
                    selected_size: i.selected_size,
                    selected_color: i.selected_color,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateStatusResponse {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub user_id: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Validates and prices the order, then stores it with status `pending`.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created, body is the stored order"),
        (status = 400, description = "Invalid input, unknown user or unknown product"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let input = CreateOrderInput::from(body.into_inner());
    let orders = state.orders.clone();

    let order = web::block(move || orders.create(input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(order))
}

/// GET /orders/{id}
///
/// Returns the order together with its items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = String, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let orders = state.orders.clone();

    let result = web::block(move || orders.get_by_id(&order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match result {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(AppError::NotFound),
    }
}

/// PUT /orders/{id}/status
///
/// Any non-empty status is accepted and written through.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(
        ("id" = String, Path, description = "Order id"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status written", body = UpdateStatusResponse),
        (status = 400, description = "Empty status"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    if status.is_empty() {
        return Err(AppError::BadRequest("status is required".into()));
    }

    let orders = state.orders.clone();
    let (id, new_status) = (order_id.clone(), status.clone());
    web::block(move || orders.update_status(&id, &new_status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(UpdateStatusResponse {
        id: order_id,
        status,
    }))
}

/// GET /orders
///
/// Orders of `user_id` when given, otherwise every order; newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("user_id" = Option<String>, Query, description = "Only orders of this user"),
    ),
    responses(
        (status = 200, description = "Orders, newest first"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let user_id = query.into_inner().user_id.filter(|u| !u.is_empty());
    let orders = state.orders.clone();

    let result = web::block(move || match user_id {
        Some(user_id) => orders.list_by_user(&user_id),
        None => orders.list_all(),
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(result))
}

/// GET /users/{user_id}/orders
#[utoipa::path(
    get,
    path = "/users/{user_id}/orders",
    params(
        ("user_id" = String, Path, description = "Owning user id"),
    ),
    responses(
        (status = 200, description = "Orders of the user, newest first"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_user_orders(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let orders = state.orders.clone();

    let result = web::block(move || orders.list_by_user(&user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(result))
}
