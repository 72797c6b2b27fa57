use crate::error::AppError;
use crate::models::Caller;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    // 前缀下只读接口公开
    read_only_prefixes: Vec<&'static str>,
    // 需要排除的路径后缀（即使在公开前缀下也需要认证）
    excluded_suffixes: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
            ],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/"],
            read_only_prefixes: vec!["/api/v1/promotions"],
            excluded_suffixes: vec!["/usage-history", "/reconciliation"],
        }
    }

    fn is_public_path(&self, method: &Method, path: &str) -> bool {
        if self
            .excluded_suffixes
            .iter()
            .any(|&suffix| path.ends_with(suffix))
        {
            return false;
        }

        if self.exact_paths.contains(&path) {
            return true;
        }

        if self
            .prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }

        method == Method::GET
            && self
                .read_only_prefixes
                .iter()
                .any(|&prefix| path.starts_with(prefix))
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let is_public = self.public_paths.is_public_path(req.method(), req.path());

        let caller = match bearer_token(&req) {
            Some(token) => match self
                .jwt_service
                .verify_access_token(token)
                .and_then(|claims| claims.caller())
            {
                Ok(caller) => Some(caller),
                // 公开接口忽略无效令牌, 按匿名处理
                Err(_) if is_public => None,
                Err(e) => {
                    log::warn!("Rejected access token on {}: {e}", req.path());
                    let error = AppError::AuthError("Invalid access token".to_string());
                    return Box::pin(async move { Err(error.into()) });
                }
            },
            None => None,
        };

        match caller {
            Some(caller) => {
                // 将调用者身份添加到请求扩展中
                req.extensions_mut().insert(caller);
            }
            None if !is_public => {
                let error = AppError::AuthError("Missing access token".to_string());
                return Box::pin(async move { Err(error.into()) });
            }
            None => {}
        }

        let fut = self.service.call(req);
        Box::pin(fut)
    }
}

/// 获取当前调用者, 未登录时返回 AuthError
pub fn current_caller(req: &HttpRequest) -> Result<Caller, AppError> {
    req.extensions()
        .get::<Caller>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}
