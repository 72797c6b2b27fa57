use crate::middlewares::current_caller;
use crate::models::*;
use crate::services::PromotionDetailService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/promotions/{id}/details",
    tag = "promotion_detail",
    params(("id" = Uuid, Path, description = "优惠ID")),
    responses(
        (status = 200, description = "获取房型覆盖规则成功", body = [PromotionDetail]),
        (status = 404, description = "优惠不存在")
    )
)]
pub async fn list_details(
    detail_service: web::Data<PromotionDetailService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match detail_service.list_details(path.into_inner()).await {
        Ok(details) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": details
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/promotions/{id}/details/bulk",
    tag = "promotion_detail",
    params(("id" = Uuid, Path, description = "优惠ID")),
    request_body = BulkCreateDetailsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "批量创建成功", body = [PromotionDetail]),
        (status = 400, description = "批次中存在不合法的行"),
        (status = 403, description = "无权限"),
        (status = 409, description = "房型已存在覆盖规则")
    )
)]
pub async fn bulk_create_details(
    detail_service: web::Data<PromotionDetailService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<BulkCreateDetailsRequest>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match detail_service
        .bulk_create(&caller, path.into_inner(), request.into_inner())
        .await
    {
        Ok(details) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": details,
            "message": "Promotion details created"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/promotions/{id}/details/bulk-update",
    tag = "promotion_detail",
    params(("id" = Uuid, Path, description = "优惠ID")),
    request_body = BulkUpdateDetailsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "批量更新成功", body = [PromotionDetail]),
        (status = 400, description = "批次中存在不属于该优惠的行"),
        (status = 403, description = "无权限")
    )
)]
pub async fn bulk_update_details(
    detail_service: web::Data<PromotionDetailService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<BulkUpdateDetailsRequest>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match detail_service
        .bulk_update(&caller, path.into_inner(), request.into_inner())
        .await
    {
        Ok(details) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": details,
            "message": "Promotion details updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/promotions/{id}/details/bulk-delete",
    tag = "promotion_detail",
    params(("id" = Uuid, Path, description = "优惠ID")),
    request_body = BulkDeleteDetailsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "批量删除成功", body = BulkDeleteDetailsResponse),
        (status = 400, description = "批次中存在不属于该优惠的行"),
        (status = 403, description = "无权限")
    )
)]
pub async fn bulk_delete_details(
    detail_service: web::Data<PromotionDetailService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<BulkDeleteDetailsRequest>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match detail_service
        .bulk_delete(&caller, path.into_inner(), request.into_inner())
        .await
    {
        Ok(deleted) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": BulkDeleteDetailsResponse { deleted },
            "message": "Promotion details deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/promotions/{id}/details/{detail_id}",
    tag = "promotion_detail",
    params(
        ("id" = Uuid, Path, description = "优惠ID"),
        ("detail_id" = Uuid, Path, description = "覆盖规则ID")
    ),
    request_body = UpdateDetailRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = PromotionDetail),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "覆盖规则不存在")
    )
)]
pub async fn update_detail(
    detail_service: web::Data<PromotionDetailService>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    request: web::Json<UpdateDetailRequest>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let (promotion_id, detail_id) = path.into_inner();

    match detail_service
        .update_detail(&caller, promotion_id, detail_id, request.into_inner())
        .await
    {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/promotions/{id}/details/{detail_id}",
    tag = "promotion_detail",
    params(
        ("id" = Uuid, Path, description = "优惠ID"),
        ("detail_id" = Uuid, Path, description = "覆盖规则ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 404, description = "覆盖规则不存在")
    )
)]
pub async fn delete_detail(
    detail_service: web::Data<PromotionDetailService>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };
    let (promotion_id, detail_id) = path.into_inner();

    match detail_service
        .delete_detail(&caller, promotion_id, detail_id)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::<()>::message(
            "Promotion detail deleted",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 挂在 /promotions 作用域下; 批量路由需先于 {detail_id} 注册
pub fn promotion_detail_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/{id}/details", web::get().to(list_details))
        .route("/{id}/details/bulk", web::post().to(bulk_create_details))
        .route("/{id}/details/bulk-update", web::put().to(bulk_update_details))
        .route("/{id}/details/bulk-delete", web::post().to(bulk_delete_details))
        .route("/{id}/details/{detail_id}", web::put().to(update_detail))
        .route("/{id}/details/{detail_id}", web::delete().to(delete_detail));
}
