use actix_web::web;

pub mod routes {
    pub mod email;
}

pub mod services {
    pub mod composer;
    pub mod email;
    pub mod prompts;
}

pub mod dtos {
    pub mod email;
}

pub fn mount_emails() -> actix_web::Scope {
    web::scope("/email")
        .service(routes::email::post_generate)
        .service(routes::email::post_update)
        .service(routes::email::get_history)
        .service(routes::email::delete_email)
}
