use actix_web::web::{self};

pub mod routes {
    pub mod sub;
}

pub mod services {
    pub mod activation;
    pub mod catalog;
    pub mod expiry;
    pub mod freshness;
    pub mod limits;
    pub mod usage;
}

pub mod dtos {
    pub mod sub;
}

pub mod models {
    pub mod plan;
    pub mod usage;
}

pub fn mount_plans() -> actix_web::Scope {
    web::scope("/sub").service(routes::sub::get_plans)
}
pub fn mount_subs() -> actix_web::Scope {
    web::scope("/sub")
        .service(routes::sub::get_usage)
        .service(routes::sub::get_current)
        .service(routes::sub::post_activate)
}
