use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use serde_json::json;

mod database;
mod middleware;
mod post;
mod router;
mod user;
mod utils;

use middleware::error_handler::{handle_error, json_error_handler, query_error_handler};
use middleware::not_found::not_found;
use post::post_service::PostService;
use router::index::routes;
use user::service::UserService;
use utils::config::{AppConfig, AuthConfig};
use utils::helpers::service_name;
use utils::uploads::UploadService;

const JSON_BODY_LIMIT: usize = 16 * 1024;

#[get("/")]
async fn default() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Welcome to the blog API",
        "httpStatusCode": StatusCode::OK.as_u16(),
        "service": service_name(),
    }))
}

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .supports_credentials()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600),
        None => Cors::default(),
    }
}

fn config_error(message: String) -> std::io::Error {
    error!("Invalid configuration: {}", message);
    std::io::Error::new(std::io::ErrorKind::InvalidInput, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app_config = AppConfig::from_env().map_err(config_error)?;
    let auth_config = web::Data::new(AuthConfig::from_env().map_err(config_error)?);
    let upload_service = web::Data::new(UploadService::new().map_err(config_error)?);

    let mongo_client = database::connect_to_mongo(&app_config.mongodb_uri)
        .await
        .map_err(std::io::Error::other)?;

    let user_service = web::Data::new(UserService::new(&mongo_client, &app_config.database_name));
    user_service.ensure_indexes().await.map_err(|e| {
        error!("{}", e);
        std::io::Error::other(e)
    })?;
    let post_service = web::Data::new(PostService::new(&mongo_client, &app_config.database_name));

    let cors_origin = app_config.cors_origin.clone();
    if cors_origin.is_none() {
        info!("CORS_ORIGIN not set; cross-origin requests will be rejected");
    }

    info!(
        "Starting server on http://{}:{}",
        app_config.host, app_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(auth_config.clone())
            .app_data(upload_service.clone())
            .app_data(user_service.clone())
            .app_data(post_service.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(JSON_BODY_LIMIT)
                    .error_handler(json_error_handler),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .configure(routes)
            .service(default)
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::NOT_FOUND, not_found)
                    .default_handler(handle_error),
            )
            .wrap(cors(cors_origin.as_deref()))
            .wrap(Logger::default())
    })
    .bind((app_config.host.as_str(), app_config.port))?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
