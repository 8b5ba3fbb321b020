//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod configuration;
#[allow(clippy::missing_errors_doc)]
pub mod procedures;
#[allow(clippy::missing_errors_doc)]
pub mod processes;
#[allow(clippy::missing_errors_doc)]
pub mod schedules;
#[allow(clippy::missing_errors_doc)]
pub mod sequels;

use axum::Router;
use axum::routing::{get, post, put};

use autoproc_app::ports::{ControlPlane, MessageBroker, SnapshotStore};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<CP, SS, B>() -> Router<AppState<CP, SS, B>>
where
    CP: ControlPlane + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
    B: MessageBroker + Send + Sync + 'static,
{
    Router::new()
        // Processes
        .route("/processes", get(processes::list::<CP, SS, B>))
        .route("/processes/{name}", get(processes::get::<CP, SS, B>))
        .route(
            "/processes/{name}/procedures",
            get(processes::procedures::<CP, SS, B>),
        )
        .route(
            "/processes/{name}/restriction",
            put(processes::set_restriction::<CP, SS, B>),
        )
        .route(
            "/processes/{name}/execute",
            post(processes::execute::<CP, SS, B>),
        )
        // Procedures
        .route(
            "/procedures/{name}",
            get(procedures::get::<CP, SS, B>).put(procedures::set_status::<CP, SS, B>),
        )
        // Schedules
        .route(
            "/processes/{name}/schedules",
            get(schedules::list::<CP, SS, B>),
        )
        .route(
            "/processes/{name}/schedules/{id}",
            put(schedules::enable::<CP, SS, B>).delete(schedules::disable::<CP, SS, B>),
        )
        .route(
            "/processes/{name}/schedules/{id}/run",
            post(schedules::run::<CP, SS, B>),
        )
        // Sequels
        .route("/processes/{name}/sequels", get(sequels::list::<CP, SS, B>))
        .route(
            "/processes/{name}/sequels/{successor}",
            put(sequels::set::<CP, SS, B>),
        )
        // Configuration
        .route(
            "/configuration",
            get(configuration::get::<CP, SS, B>).put(configuration::load::<CP, SS, B>),
        )
        .route(
            "/configuration/reset",
            post(configuration::reset::<CP, SS, B>),
        )
        .route(
            "/configuration/store",
            post(configuration::store::<CP, SS, B>),
        )
}
