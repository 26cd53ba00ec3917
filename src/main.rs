use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    autha_ldap::telemetry::setup_logging();

    let state = autha_ldap::initialize_state()?;
    let addr = state.config.socket_addr()?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        middleware = %state.config.middleware,
        "server started"
    );

    axum::serve(listener, autha_ldap::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
