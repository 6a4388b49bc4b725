use std::net::TcpListener;

use actix_web::{dev::Server, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::client::BackendClient;

pub mod client;
pub mod configuration;
pub mod model;
pub mod render;
pub mod routes;
pub mod summary;
pub mod telemetry;

pub fn run(listener: TcpListener, client: BackendClient) -> Result<Server, std::io::Error> {
    let client = web::Data::new(client);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(client.clone())
            .service(routes::dashboard::dashboard)
            .service(routes::simulate::simulate)
            .service(routes::summary::summary)
            .service(routes::connection_test::connection_test)
            .service(routes::health_check::health_check)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
