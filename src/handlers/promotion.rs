use crate::middlewares::current_caller;
use crate::models::*;
use crate::services::PromotionService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/promotions",
    tag = "promotion",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "状态: active/inactive"),
        ("code" = Option<String>, Query, description = "优惠码模糊匹配"),
        ("start_date" = Option<String>, Query, description = "valid_from 不早于该时间 (RFC 3339)"),
        ("end_date" = Option<String>, Query, description = "valid_until 不晚于该时间 (RFC 3339)"),
        ("hotel_id" = Option<Uuid>, Query, description = "酒店ID")
    ),
    responses(
        (status = 200, description = "获取优惠列表成功")
    )
)]
pub async fn list_promotions(
    promotion_service: web::Data<PromotionService>,
    query: web::Query<PromotionQuery>,
) -> Result<HttpResponse> {
    match promotion_service.list_promotions(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/promotions/code/{code}",
    tag = "promotion",
    params(("code" = String, Path, description = "优惠码")),
    responses(
        (status = 200, description = "获取优惠成功", body = Promotion),
        (status = 404, description = "优惠不存在")
    )
)]
pub async fn get_promotion_by_code(
    promotion_service: web::Data<PromotionService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match promotion_service.get_promotion_by_code(&path).await {
        Ok(promotion) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": promotion
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/promotions/{id}",
    tag = "promotion",
    params(("id" = Uuid, Path, description = "优惠ID")),
    responses(
        (status = 200, description = "获取优惠成功", body = Promotion),
        (status = 404, description = "优惠不存在")
    )
)]
pub async fn get_promotion(
    promotion_service: web::Data<PromotionService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match promotion_service.get_promotion(path.into_inner()).await {
        Ok(promotion) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": promotion
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/promotions",
    tag = "promotion",
    request_body = CreatePromotionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "创建优惠成功", body = Promotion),
        (status = 400, description = "请求参数错误"),
        (status = 403, description = "无权限"),
        (status = 409, description = "优惠码已存在")
    )
)]
pub async fn create_promotion(
    promotion_service: web::Data<PromotionService>,
    req: HttpRequest,
    request: web::Json<CreatePromotionRequest>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match promotion_service
        .create_promotion(&caller, request.into_inner())
        .await
    {
        Ok(promotion) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": promotion,
            "message": "Promotion created"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/promotions/{id}",
    tag = "promotion",
    params(("id" = Uuid, Path, description = "优惠ID")),
    request_body = UpdatePromotionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新优惠成功", body = Promotion),
        (status = 400, description = "请求参数错误"),
        (status = 403, description = "无权限"),
        (status = 404, description = "优惠不存在")
    )
)]
pub async fn update_promotion(
    promotion_service: web::Data<PromotionService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdatePromotionRequest>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match promotion_service
        .update_promotion(&caller, path.into_inner(), request.into_inner())
        .await
    {
        Ok(promotion) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": promotion,
            "message": "Promotion updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/promotions/{id}",
    tag = "promotion",
    params(("id" = Uuid, Path, description = "优惠ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除优惠成功"),
        (status = 403, description = "无权限"),
        (status = 404, description = "优惠不存在"),
        (status = 409, description = "已有使用记录, 只能停用")
    )
)]
pub async fn delete_promotion(
    promotion_service: web::Data<PromotionService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let caller = match current_caller(&req) {
        Ok(caller) => caller,
        Err(e) => return Ok(e.error_response()),
    };

    match promotion_service
        .delete_promotion(&caller, path.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::<()>::message("Promotion deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/promotions/validate",
    tag = "promotion",
    request_body = ValidatePromotionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "优惠码可用", body = ValidatePromotionResponse),
        (status = 400, description = "优惠码不可用, error.code 给出原因", body = ApiError),
        (status = 401, description = "未授权"),
        (status = 404, description = "优惠码不存在", body = ApiError)
    )
)]
pub async fn validate_promotion(
    promotion_service: web::Data<PromotionService>,
    req: HttpRequest,
    request: web::Json<ValidatePromotionRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();

    let mut ctx = BookingContext::new(request.booking_total);
    ctx.hotel_id = request.hotel_id;
    ctx.room_type_id = request.room_type_id;
    ctx.user_id = req.extensions().get::<Caller>().map(|c| c.user_id);

    match promotion_service.quote(&request.code, &ctx).await {
        Ok(quote) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": ValidatePromotionResponse::from(&quote)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn promotion_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/promotions")
            .route("", web::get().to(list_promotions))
            .route("", web::post().to(create_promotion))
            .route("/validate", web::post().to(validate_promotion))
            .route("/code/{code}", web::get().to(get_promotion_by_code))
            .configure(super::promotion_detail::promotion_detail_config)
            .configure(super::promotion_usage::promotion_usage_config)
            .route("/{id}", web::get().to(get_promotion))
            .route("/{id}", web::put().to(update_promotion))
            .route("/{id}", web::delete().to(delete_promotion)),
    );
}
