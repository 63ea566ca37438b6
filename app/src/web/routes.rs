// app/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::web::handlers::{
  admin_handlers as admin, auth_handlers as auth, cart_handlers as cart, catalog_handlers as catalog,
  chat_handlers as chats, favourite_handlers as favourites, notification_handlers as notifications,
  order_handlers as orders,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route("/signup", web::post().to(auth::signup_handler))
          .route("/signin", web::post().to(auth::signin_handler))
          .route("/logout", web::post().to(auth::logout_handler))
          .route("/me", web::get().to(auth::me_handler))
          .route("/update-password", web::post().to(auth::update_password_handler))
          .route("/reset-password", web::post().to(auth::reset_password_handler))
          .route("/reset-password/confirm", web::post().to(auth::confirm_password_reset_handler)),
      )
      .service(
        web::resource("/categories")
          .route(web::get().to(catalog::list_categories_handler))
          .route(web::post().to(catalog::create_category_handler)),
      )
      .service(
        web::scope("/products")
          .route("/bestsellers", web::get().to(catalog::bestsellers_handler))
          .route("/slug/{slug}", web::get().to(catalog::get_product_by_slug_handler))
          .route("/category/{slug}", web::get().to(catalog::products_in_category_handler))
          .route("/{product_id}", web::get().to(catalog::get_product_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart::get_cart_handler))
          .route("", web::delete().to(cart::clear_cart_handler))
          .route("/add", web::post().to(cart::add_to_cart_handler))
          .route("/merge", web::post().to(cart::merge_cart_handler))
          .route("/{product_id}", web::patch().to(cart::update_cart_item_handler))
          .route("/{product_id}", web::delete().to(cart::remove_cart_item_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(orders::list_orders_handler))
          .route("", web::post().to(orders::place_order_handler))
          .route("", web::delete().to(orders::delete_order_handler))
          .route("/{order_id}", web::get().to(orders::get_order_handler)),
      )
      .service(
        web::scope("/favourites")
          .route("", web::get().to(favourites::list_favourites_handler))
          .route("", web::post().to(favourites::add_favourite_handler))
          .route("/{product_id}", web::delete().to(favourites::remove_favourite_handler)),
      )
      .service(
        web::scope("/notifications")
          .route("", web::get().to(notifications::list_notifications_handler))
          .route("/unread-count", web::get().to(notifications::unread_count_handler))
          .route("/read-all", web::post().to(notifications::mark_all_read_handler))
          .route("/{notification_id}", web::patch().to(notifications::mark_notification_handler)),
      )
      .service(
        web::scope("/chats")
          .route("", web::get().to(chats::list_chats_handler))
          .route("", web::post().to(chats::open_chat_handler))
          .route("/{chat_id}", web::get().to(chats::get_chat_handler))
          .route("/{chat_id}/messages", web::post().to(chats::send_message_handler)),
      )
      .service(
        web::scope("/admin")
          .service(
            web::scope("/categories")
              .route("", web::get().to(admin::list_categories_handler))
              .route("", web::post().to(admin::create_category_handler))
              .route("/{id}", web::get().to(admin::get_category_handler))
              .route("/{id}", web::patch().to(admin::update_category_handler))
              .route("/{id}", web::delete().to(admin::delete_category_handler)),
          )
          .service(
            web::scope("/products")
              .route("", web::get().to(admin::list_products_handler))
              .route("", web::post().to(admin::create_product_handler))
              .route("/{id}", web::get().to(admin::get_product_handler))
              .route("/{id}", web::patch().to(admin::update_product_handler))
              .route("/{id}/offline", web::patch().to(admin::set_offline_purchases_handler))
              .route("/{id}", web::delete().to(admin::delete_product_handler)),
          )
          .service(
            web::scope("/users")
              .route("", web::get().to(admin::list_users_handler))
              .route("", web::post().to(admin::create_user_handler))
              .route("/{id}", web::get().to(admin::get_user_handler))
              .route("/{id}", web::patch().to(admin::update_user_handler))
              .route("/{id}", web::delete().to(admin::delete_user_handler)),
          )
          .service(
            web::scope("/orders")
              .route("", web::get().to(admin::list_orders_handler))
              .route("/{id}", web::get().to(admin::get_order_handler))
              .route("/{id}", web::patch().to(admin::update_order_status_handler))
              .route("/{id}/edit", web::patch().to(admin::edit_order_handler))
              .route("/{id}", web::delete().to(admin::delete_order_handler)),
          )
          .route("/chats", web::get().to(chats::admin_list_chats_handler)),
      ),
  );
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::tests::test_config;
  use crate::state::AppState;
  use actix_web::{http::StatusCode, test, App};
  use sqlx::postgres::PgPoolOptions;
  use std::sync::Arc;

  // A lazy pool never connects, so only routes that fail before touching the
  // database are exercised here.
  fn lazy_state() -> AppState {
    let config = Arc::new(test_config());
    let pool = PgPoolOptions::new()
      .connect_lazy(&config.database_url)
      .expect("lazy pool");
    AppState::new(pool, config)
  }

  #[actix_web::test]
  async fn health_answers_ok() {
    let app = test::init_service(App::new().configure(configure_app_routes)).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
  }

  #[actix_web::test]
  async fn member_api_requires_a_session() {
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(lazy_state()))
        .configure(configure_app_routes),
    )
    .await;
    for uri in [
      "/api/cart",
      "/api/orders",
      "/api/favourites",
      "/api/notifications",
      "/api/notifications/unread-count",
      "/api/chats",
      "/api/auth/me",
    ] {
      let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
  }

  #[actix_web::test]
  async fn admin_api_rejects_customers() {
    let state = lazy_state();
    let token = state.tokens.issue(uuid::Uuid::new_v4(), false).unwrap();
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(state))
        .configure(configure_app_routes),
    )
    .await;
    let req = test::TestRequest::get()
      .uri("/api/admin/users")
      .insert_header(("Authorization", format!("Bearer {}", token)))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Administrator access required");
  }

  #[actix_web::test]
  async fn back_office_extras_reject_customers() {
    let state = lazy_state();
    let token = state.tokens.issue(uuid::Uuid::new_v4(), false).unwrap();
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(state))
        .configure(configure_app_routes),
    )
    .await;
    let id = uuid::Uuid::new_v4();
    let requests = [
      test::TestRequest::get().uri("/api/admin/chats"),
      test::TestRequest::patch()
        .uri(&format!("/api/admin/orders/{}/edit", id))
        .set_json(serde_json::json!({ "orderItems": [], "totalAmount": "0" })),
      test::TestRequest::patch()
        .uri(&format!("/api/admin/products/{}/offline", id))
        .set_json(serde_json::json!({ "offlinePurchases": 3 })),
    ];
    for req in requests {
      let resp = test::call_service(
        &app,
        req
          .insert_header(("Authorization", format!("Bearer {}", token)))
          .to_request(),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
  }

  #[actix_web::test]
  async fn chat_message_needs_a_session() {
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(lazy_state()))
        .configure(configure_app_routes),
    )
    .await;
    let req = test::TestRequest::post()
      .uri(&format!("/api/chats/{}/messages", uuid::Uuid::new_v4()))
      .set_json(serde_json::json!({ "message": "Hello" }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
}
