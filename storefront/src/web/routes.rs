// storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{cart_handlers, checkout_handlers, payment_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .route("/cart", web::get().to(cart_handlers::get_cart_handler))
        .route("/checkout", web::post().to(checkout_handlers::start_checkout_handler)),
    )
    .service(
      web::scope("/payment")
        .service(
          web::resource("/watch/{watch_id}")
            .route(web::get().to(payment_handlers::watch_snapshot_handler))
            .route(web::delete().to(payment_handlers::unmount_watch_handler)),
        )
        .route("/{route}", web::get().to(payment_handlers::payment_return_handler)),
    );
}
