use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::stats::DailyRevenue;
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RevenueParams {
    /// `YYYY-MM-DD`, inclusive.
    pub start_date: Option<NaiveDate>,
    /// `YYYY-MM-DD`, inclusive of the whole day.
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct RevenueSummary {
    pub total_revenue: BigDecimal,
    pub revenue_by_day: Vec<DailyRevenue>,
}

/// GET /analytics/dashboard
#[utoipa::path(
    get,
    path = "/analytics/dashboard",
    responses(
        (status = 200, description = "Dashboard snapshot, at most 15 seconds old"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "analytics"
)]
pub async fn dashboard(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let analytics = state.analytics.clone();
    let stats = web::block(move || analytics.dashboard_stats())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(stats.as_ref()))
}

/// GET /analytics/top-products
#[utoipa::path(
    get,
    path = "/analytics/top-products",
    responses(
        (status = 200, description = "Up to ten best-selling products by revenue"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "analytics"
)]
pub async fn top_products(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let analytics = state.analytics.clone();
    let stats = web::block(move || analytics.dashboard_stats())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(&stats.top_products))
}

/// GET /analytics/orders-by-status
#[utoipa::path(
    get,
    path = "/analytics/orders-by-status",
    responses(
        (status = 200, description = "Order count per status"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "analytics"
)]
pub async fn orders_by_status(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let analytics = state.analytics.clone();
    let stats = web::block(move || analytics.dashboard_stats())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(&stats.orders_by_status))
}

/// GET /analytics/revenue
///
/// With both dates, daily revenue for that range read straight from the
/// store. Otherwise the dashboard's total and last 30 days.
#[utoipa::path(
    get,
    path = "/analytics/revenue",
    params(
        ("start_date" = Option<String>, Query, description = "First day, YYYY-MM-DD"),
        ("end_date" = Option<String>, Query, description = "Last day, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Daily revenue"),
        (status = 400, description = "Malformed date"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "analytics"
)]
pub async fn revenue(
    state: web::Data<AppState>,
    query: web::Query<RevenueParams>,
) -> Result<HttpResponse, AppError> {
    let analytics = state.analytics.clone();

    match query.into_inner() {
        RevenueParams {
            start_date: Some(start),
            end_date: Some(end),
        } => {
            let start = start.and_time(NaiveTime::MIN).and_utc();
            let end = end
                .and_hms_nano_opt(23, 59, 59, 999_999_999)
                .ok_or_else(|| AppError::BadRequest("invalid end_date".into()))?
                .and_utc();

            let days = web::block(move || analytics.revenue_by_period(start, end))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;
            Ok(HttpResponse::Ok().json(days))
        }
        _ => {
            let stats = web::block(move || analytics.dashboard_stats())
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;
            Ok(HttpResponse::Ok().json(RevenueSummary {
                total_revenue: stats.total_revenue.clone(),
                revenue_by_day: stats.revenue_by_day.clone(),
            }))
        }
    }
}
