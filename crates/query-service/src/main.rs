use query_service::run_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("query_service=info,tower_http=debug").init();

    if let Err(e) = run_server().await {
        tracing::error!(error = %e, "query-service exited with an error");
        std::process::exit(1);
    }

    Ok(())
}
