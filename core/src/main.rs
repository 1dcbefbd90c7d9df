mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_emails::services::composer::{ComposerClient, EmailComposer};
use common::clock::{Clock, SystemClock};
use db::store::{EmailStore, PgStore, UserStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = common::env_config::Config::from_env();
    let config_data = config.clone();

    // get info
    let is_production = config.environment == "production";
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        logger::setup().expect("Failed to set up logger");
    }

    // init db connection
    let pool = db::setup(&config.database_url, is_production)
        .await
        .expect("Failed to set up database");

    // storage, clock and email generation seams
    let store = PgStore::new(pool.clone());
    let user_store: Arc<dyn UserStore> = Arc::new(store.clone());
    let email_store: Arc<dyn EmailStore> = Arc::new(store);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let composer: Arc<dyn EmailComposer> = Arc::new(ComposerClient::new(&config.composer));

    HttpServer::new(move || {
        let secret = config_data.jwt_config.secret.as_str();
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(user_store.clone()))
            .app_data(web::Data::new(email_store.clone()))
            .app_data(web::Data::new(clock.clone()))
            .app_data(web::Data::new(composer.clone()))
            .wrap(logger::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(api_subs::mount_plans())
                    .service(
                        web::scope("/dashboard")
                            .wrap(api_auth::auth_middleware(secret))
                            .service(api_subs::mount_subs())
                            .service(api_emails::mount_emails()),
                    ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
