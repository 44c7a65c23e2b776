use mercora_api::app::build_app;
use mercora_api::config::AppConfig;

#[tokio::main]
async fn main() {
    mercora_observability::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("invalid configuration: {error:#}");
            std::process::exit(1);
        }
    };
    let bind_addr = config.bind_addr.clone();

    let app = match build_app(config).await {
        Ok(app) => app,
        Err(error) => {
            tracing::error!("startup failed: {error:#}");
            std::process::exit(1);
        }
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|error| panic!("failed to bind {bind_addr}: {error}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
