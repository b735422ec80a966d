// Route exports
pub mod account;
pub mod colleges;
pub mod deck;

use actix_web::web;

pub use deck::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(deck::configure)
            .configure(account::configure)
            .configure(colleges::configure),
    );
}
