use std::net::TcpListener;

use fraud_dashboard::{
    client::BackendClient,
    configuration::get_configuration,
    run,
    telemetry::{get_subscriber, init_subscriber},
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("fraud-dashboard", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let configuration = get_configuration()?;
    let client = BackendClient::new(&configuration.backend)?;

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!(
        "Serving dashboard on {} for backend {}",
        address,
        client.base_url()
    );

    run(listener, client)?.await?;
    Ok(())
}
