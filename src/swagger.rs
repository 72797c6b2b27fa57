use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{DiscountType, PromotionStatus, PromotionType};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::promotion::list_promotions,
        handlers::promotion::get_promotion_by_code,
        handlers::promotion::get_promotion,
        handlers::promotion::create_promotion,
        handlers::promotion::update_promotion,
        handlers::promotion::delete_promotion,
        handlers::promotion::validate_promotion,
        handlers::promotion_detail::list_details,
        handlers::promotion_detail::bulk_create_details,
        handlers::promotion_detail::bulk_update_details,
        handlers::promotion_detail::bulk_delete_details,
        handlers::promotion_detail::update_detail,
        handlers::promotion_detail::delete_detail,
        handlers::promotion_usage::get_usage_history,
        handlers::promotion_usage::get_reconciliation,
    ),
    components(
        schemas(
            Promotion,
            PromotionStatus,
            PromotionType,
            DiscountType,
            CreatePromotionRequest,
            UpdatePromotionRequest,
            PromotionQuery,
            ValidatePromotionRequest,
            ValidatePromotionResponse,
            PromotionDetail,
            CreateDetailInput,
            UpdateDetailInput,
            BulkCreateDetailsRequest,
            BulkUpdateDetailsRequest,
            BulkDeleteDetailsRequest,
            BulkDeleteDetailsResponse,
            UpdateDetailRequest,
            PromotionUsage,
            UsageHistoryQuery,
            ReconciliationReport,
            PaginationParams,
            Role,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "promotion", description = "Promotion management and validation API"),
        (name = "promotion_detail", description = "Room-type override API"),
        (name = "promotion_usage", description = "Redemption history API"),
    ),
    info(
        title = "Promotion Backend API",
        version = "1.0.0",
        description = "Hotel booking promotion REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
