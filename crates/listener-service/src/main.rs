use anyhow::Result;
use listener_service::ListenerService;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("listener_service=info,rdkafka=info").init();

    let service = ListenerService::new().await?;

    let ctrl_c = tokio::signal::ctrl_c();

    tokio::select! {
        result = service.run() => {
            if let Err(e) = result {
                error!(error = %e, "listener-service encountered an error");
            }
        }
        _ = ctrl_c => {
            info!("received shutdown signal, draining in-flight applies");
            if let Err(e) = service.shutdown().await {
                error!(error = %e, "error during listener-service shutdown");
            } else {
                info!("listener-service shutdown cleanly");
            }
        }
    }

    Ok(())
}
