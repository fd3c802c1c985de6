use notification_client::{
    config::ClientConfig, error::ClientError, logging, models::Subscription,
    websocket::NotificationClient,
};
use std::env;
use uuid::Uuid;

/// Headless watcher: connects as the configured user/workspace and logs
/// every alert the client emits. Useful against a staging endpoint.
#[tokio::main]
async fn main() -> Result<(), ClientError> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = ClientConfig::from_env()?;
    let subscription = subscription_from_env()?;

    tracing::info!(
        endpoint = %config.endpoint,
        user = %subscription.user_id,
        workspace = %subscription.workspace_id,
        "Starting notification watcher"
    );

    let (client, mut alerts) = NotificationClient::connect(config, subscription, None);

    loop {
        tokio::select! {
            alert = alerts.recv() => match alert {
                Some(alert) => {
                    tracing::info!(
                        kind = alert.kind.as_str(),
                        title = %alert.title,
                        message = %alert.message,
                        duration_ms = alert.duration_ms,
                        "Alert"
                    );
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    client.shutdown().await;
    Ok(())
}

fn subscription_from_env() -> Result<Subscription, ClientError> {
    let user_id = parse_uuid_env("NOTIFY_USER_ID")?;
    let workspace_id = parse_uuid_env("NOTIFY_WORKSPACE_ID")?;
    Ok(Subscription::new(user_id, workspace_id))
}

fn parse_uuid_env(key: &str) -> Result<Uuid, ClientError> {
    let raw = env::var(key).map_err(|_| ClientError::Config(format!("{key} must be set")))?;
    raw.parse::<Uuid>()
        .map_err(|e| ClientError::Config(format!("{key} is not a valid UUID: {e}")))
}
