use crate::middlewares::current_caller;
use crate::models::*;
use crate::services::PromotionUsageService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/promotions/{id}/usage-history",
    tag = "promotion_usage",
    params(
        ("id" = Uuid, Path, description = "优惠ID"),
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取核销记录成功"),
        (status = 401, description = "未授权"),
        (status = 403, description = "无权限")
    )
)]
pub async fn get_usage_history(
    usage_service: web::Data<PromotionUsageService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    query: web::Query<UsageHistoryQuery>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match usage_service
        .usage_history(&caller, path.into_inner(), &query)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/promotions/{id}/reconciliation",
    tag = "promotion_usage",
    params(("id" = Uuid, Path, description = "优惠ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "对账结果", body = ReconciliationReport),
        (status = 403, description = "无权限")
    )
)]
pub async fn get_reconciliation(
    usage_service: web::Data<PromotionUsageService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match usage_service.reconcile(&caller, path.into_inner()).await {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": report
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn promotion_usage_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/{id}/usage-history", web::get().to(get_usage_history))
        .route("/{id}/reconciliation", web::get().to(get_reconciliation));
}
