use std::{rc::Rc, sync::Arc, time::Instant};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::StatusCode,
    web,
};
use colored::{ColoredString, Colorize};
use common::env_config::Config;
use db::models::user::User;
use futures::future::{LocalBoxFuture, Ready, ready};
use log::info;

#[derive(Default)]
pub struct LoggerMiddleware {}

impl LoggerMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let query_string = req.query_string().to_string();

        let console_logging_enabled = req
            .app_data::<web::Data<Arc<Config>>>()
            .is_some_and(|config| config.console_logging_enabled);
        let srv = Rc::clone(&self.service);

        Box::pin(async move {
            let started = Instant::now();
            let res = srv.call(req).await?;

            if console_logging_enabled {
                // set by the auth middleware further in
                let user_id = res
                    .request()
                    .extensions()
                    .get::<User>()
                    .map(|user| user.id.to_string());

                info!(
                    "[{}] {} {}{} {} user_id={}",
                    colored_status(res.status()),
                    colored_method(&method),
                    path.bright_white(),
                    if query_string.is_empty() {
                        String::new()
                    } else {
                        format!("?{}", query_string)
                    },
                    format!("({}ms)", started.elapsed().as_millis()).bright_black(),
                    user_id.unwrap_or_else(|| "None".to_string()).bright_blue(),
                );
            }

            Ok(res)
        })
    }
}

fn colored_status(status: StatusCode) -> ColoredString {
    let code = status.as_u16();
    match code {
        200..=299 => code.to_string().green(),
        300..=399 => code.to_string().yellow(),
        400..=499 => code.to_string().bright_red(),
        _ => code.to_string().red(),
    }
}

fn colored_method(method: &str) -> ColoredString {
    match method {
        "GET" => method.blue(),
        "POST" => method.yellow(),
        "PUT" => method.purple(),
        "DELETE" => method.red(),
        _ => method.normal(),
    }
}
