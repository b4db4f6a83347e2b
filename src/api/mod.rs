mod dto;
mod error;

pub use error::ApiError;

use std::collections::BTreeMap;
use std::sync::Arc;

use actix::Addr;
use actix_web::{web, App, HttpResponse, HttpServer};
use chrono::Utc;
use uuid::Uuid;

use crate::actors::{CoordinatorActor, GetSystemHealth, TriggerScan};
use crate::domain::order::{OrderCommandHandler, OrderQuery, StatusFilter, DEFAULT_PAGE_SIZE};
use crate::reporting::{compute_kpis, DEFAULT_TOP_N};
use dto::*;

// ============================================================================
// Admin HTTP API
// ============================================================================
//
// Thin layer over OrderCommandHandler and the reporting functions. Every
// response uses the {success, message?, data?, pagination?} envelope.
//
//   GET    /api/health
//   GET    /api/orders?page&limit&search&status
//   POST   /api/orders
//   GET    /api/orders/{id}
//   PUT    /api/orders/{id}
//   DELETE /api/orders/{id}
//   PUT    /api/orders/{id}/confirm
//   GET    /api/kpis?period|from&to&top
//   POST   /api/scan
//
// ============================================================================

pub struct AppState {
    pub orders: Arc<OrderCommandHandler>,
    /// Absent when the API runs without the actor system (tests).
    pub coordinator: Option<Addr<CoordinatorActor>>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health))
            .route("/orders", web::get().to(list_orders))
            .route("/orders", web::post().to(create_order))
            .route("/orders/{id}", web::get().to(get_order))
            .route("/orders/{id}", web::put().to(update_order))
            .route("/orders/{id}", web::delete().to(delete_order))
            .route("/orders/{id}/confirm", web::put().to(confirm_order))
            .route("/kpis", web::get().to(kpis))
            .route("/scan", web::post().to(trigger_scan)),
    );
}

pub async fn start_api_server(state: web::Data<AppState>, port: u16) -> std::io::Result<()> {
    tracing::info!("🌐 Starting API server on http://0.0.0.0:{}/api", port);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}

// ============================================================================
// Handlers
// ============================================================================

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let Some(ref coordinator) = state.coordinator else {
        return HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "status": "healthy",
        }));
    };

    match coordinator.send(GetSystemHealth).await {
        Ok(health) => {
            let components: BTreeMap<_, _> = health
                .components
                .iter()
                .map(|(name, c)| (name.clone(), c.status.label()))
                .collect();

            let body = serde_json::json!({
                "success": !health.overall_status.is_unhealthy(),
                "status": health.overall_status.label(),
                "message": health.overall_status.reason(),
                "components": components,
                "checkedAt": health.check_time,
            });

            if health.overall_status.is_unhealthy() {
                HttpResponse::ServiceUnavailable().json(body)
            } else {
                HttpResponse::Ok().json(body)
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Coordinator unreachable");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "success": false,
                "status": "unhealthy",
                "message": "Coordinator unreachable",
            }))
        }
    }
}

async fn list_orders(
    state: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();

    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some("confirmed") => Some(StatusFilter::Confirmed),
        Some("unconfirmed") => Some(StatusFilter::Unconfirmed),
        Some(other) => {
            return Err(ApiError::InvalidField {
                field: "status",
                reason: format!("unknown status '{}'", other),
            })
        }
    };

    let query = OrderQuery {
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        search: params.search,
        status,
    };

    let page = state.orders.list(&query).await?;
    Ok(HttpResponse::Ok().json(Envelope::from(page)))
}

async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body
        .into_inner()
        .into_new_order()
        .map_err(|field| ApiError::MissingField { field })?;

    let order = state.orders.create(request).await?;

    Ok(HttpResponse::Created()
        .json(Envelope::data(OrderView::from(&order)).with_message("Order created")))
}

async fn get_order(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.orders.get(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Envelope::data(OrderView::from(&order))))
}

async fn update_order(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    body: web::Json<UpdateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .orders
        .edit(id.into_inner(), body.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok()
        .json(Envelope::data(OrderView::from(&order)).with_message("Order updated")))
}

async fn delete_order(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    state.orders.delete(id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Order deleted",
    })))
}

async fn confirm_order(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    body: web::Json<ConfirmRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let quantity = body.quantity.ok_or(ApiError::MissingField { field: "quantity" })?;
    let date = body.date.ok_or(ApiError::MissingField { field: "date" })?;

    let order = state.orders.confirm(id.into_inner(), quantity, date).await?;

    Ok(HttpResponse::Ok()
        .json(Envelope::data(OrderView::from(&order)).with_message("Confirmation recorded")))
}

async fn kpis(
    state: web::Data<AppState>,
    params: web::Query<KpiParams>,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();

    let (start, end) = match (params.from, params.to) {
        (Some(from), Some(to)) if from <= to => (from, to),
        (Some(_), Some(_)) => {
            return Err(ApiError::InvalidField {
                field: "from",
                reason: "must not be after 'to'".to_string(),
            })
        }
        (Some(_), None) => return Err(ApiError::MissingField { field: "to" }),
        (None, Some(_)) => return Err(ApiError::MissingField { field: "from" }),
        (None, None) => params
            .period
            .unwrap_or_default()
            .window(Utc::now().date_naive()),
    };

    let orders = state.orders.snapshot().await?;
    let report = compute_kpis(&orders, start, end, params.top.unwrap_or(DEFAULT_TOP_N));

    Ok(HttpResponse::Ok().json(Envelope::data(report)))
}

async fn trigger_scan(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let Some(ref coordinator) = state.coordinator else {
        return Err(crate::actors::ScanError::Unavailable.into());
    };

    let report = coordinator
        .send(TriggerScan)
        .await
        .map_err(|_| crate::actors::ScanError::Unavailable)??;

    Ok(HttpResponse::Ok().json(Envelope::data(ScanView::from(report))))
}

// ============================================================================
// Tests
// ============================================================================
