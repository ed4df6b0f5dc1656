use super::controller::{
    get_current_user, login_user, logout_user, register_user, renew_access_token,
};
use crate::middleware::auth::verify_access_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .route("/register", web::post().to(register_user))
            .route("/login", web::post().to(login_user))
            .route("/refreshToken", web::post().to(renew_access_token))
            .service(
                web::resource("/logout")
                    .wrap(HttpAuthentication::with_fn(verify_access_token))
                    .route(web::post().to(logout_user)),
            )
            .service(
                web::resource("/getCurrentUser")
                    .wrap(HttpAuthentication::with_fn(verify_access_token))
                    .route(web::post().to(get_current_user)),
            ),
    );
}
