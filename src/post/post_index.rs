use super::post_controller::{create_post, delete_post, get_all_posts, get_post_by_id, update_post};
use crate::middleware::auth::verify_access_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn post_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/posts")
            .route("", web::get().to(get_all_posts))
            .route("/", web::get().to(get_all_posts))
            .service(
                web::resource("/create")
                    .wrap(HttpAuthentication::with_fn(verify_access_token))
                    .route(web::post().to(create_post)),
            )
            .service(
                web::resource("/update/{post_id}")
                    .wrap(HttpAuthentication::with_fn(verify_access_token))
                    .route(web::patch().to(update_post)),
            )
            .service(
                web::resource("/delete/{post_id}")
                    .wrap(HttpAuthentication::with_fn(verify_access_token))
                    .route(web::delete().to(delete_post)),
            )
            .route("/{post_id}", web::get().to(get_post_by_id)),
    );
}
