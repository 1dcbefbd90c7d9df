use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use api_subs::services::freshness::enforce_subscription_freshness;
use common::{clock::Clock, error::AppError, jwt};
use db::store::UserStore;
use futures::future::{Ready, ok};

pub struct AuthMiddleware {
    jwt_secret: Rc<String>,
}

impl AuthMiddleware {
    pub fn new(jwt_secret: String) -> Self {
        AuthMiddleware {
            jwt_secret: Rc::new(jwt_secret),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_secret: self.jwt_secret.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_secret: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);
        let secret = self.jwt_secret.clone();
        let token = jwt::extract_token(&req);
        let store = req.app_data::<web::Data<Arc<dyn UserStore>>>().cloned();
        let clock = req.app_data::<web::Data<Arc<dyn Clock>>>().cloned();

        Box::pin(async move {
            let (Some(store), Some(clock)) = (store, clock) else {
                return Ok(req.error_response(AppError::Internal(
                    "User store or clock is not configured".to_string(),
                )));
            };

            // no token passed - 401
            let Some(token) = token else {
                return Ok(req.error_response(AppError::Unauthorized(
                    "No authorization token provided".to_string(),
                )));
            };

            let claims = match jwt::validate_jwt(&token, &secret) {
                Ok(claims) => claims,
                Err(e) => {
                    log::debug!("Rejected access token: {}", e);
                    return Ok(req.error_response(AppError::Unauthorized(
                        "Invalid or expired access token".to_string(),
                    )));
                }
            };

            // a failed read is fatal to the request
            let user = match store.find_user_by_id(claims.user_id).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    return Ok(req.error_response(AppError::NotFound(
                        "User not found".to_string(),
                    )));
                }
                Err(e) => return Ok(req.error_response(e)),
            };

            let user = enforce_subscription_freshness(&***store, user, clock.now()).await;
            req.extensions_mut().insert(user);

            srv.call(req).await.map(|res| res.map_into_boxed_body())
        })
    }
}
