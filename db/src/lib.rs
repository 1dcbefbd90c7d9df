use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgSslMode},
};
use std::{str::FromStr, sync::Arc};

pub mod email;
pub mod store;
pub mod user;

pub mod models {
    pub mod email;
    pub mod user;
}

pub mod dtos {
    pub mod email;
}

type SetupResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Connects to `database_url`, creating the database first when it does not
/// exist yet, and applies the migrations.
pub async fn setup(database_url: &str, require_ssl: bool) -> SetupResult<Arc<PgPool>> {
    let (admin_url, db_name) = maintenance_target(database_url)?;
    create_database_if_missing(&admin_url, &db_name, require_ssl).await?;

    let pool = PgPool::connect_with(connect_options(database_url, require_ssl)?).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(Arc::new(pool))
}

/// The `postgres` maintenance database on the same server, and the name of
/// the application database.
fn maintenance_target(database_url: &str) -> SetupResult<(String, String)> {
    let mut url = url::Url::parse(database_url)?;
    let db_name = url.path().trim_start_matches('/').to_string();
    if db_name.is_empty() {
        return Err("DATABASE_URL has no database name".into());
    }
    url.set_path("/postgres");
    url.set_query(None);
    Ok((url.to_string(), db_name))
}

fn connect_options(url: &str, require_ssl: bool) -> SetupResult<PgConnectOptions> {
    let options = PgConnectOptions::from_str(url)?;
    Ok(if require_ssl {
        options.ssl_mode(PgSslMode::Require)
    } else {
        options
    })
}

async fn create_database_if_missing(
    admin_url: &str,
    db_name: &str,
    require_ssl: bool,
) -> SetupResult<()> {
    let admin_pool = PgPool::connect_with(connect_options(admin_url, require_ssl)?).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&admin_pool)
            .await?;

    if !exists {
        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name.replace('"', "\"\"")))
            .execute(&admin_pool)
            .await?;
    }

    admin_pool.close().await;
    Ok(())
}
