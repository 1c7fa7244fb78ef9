#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

use config::{ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;
use model::db::cache::QuestionCounts;

/// Assemble the server: routes, fairings, and managed state.
/// Fairing order matters: the database fairing must run before anything
/// that needs a `Database` in managed state.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .manage(QuestionCounts::new())
}
