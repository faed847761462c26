use dynamo_tail::{Client, Directory, DynamodbClient, ENV_DYNAMODB_ENDPOINT_URL};

use std::env;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

const TABLE: &str = "People";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::new();
    tracing::subscriber::set_global_default(subscriber)?;

    let table_name = env::args().nth(1).unwrap_or_else(|| TABLE.to_string());

    let client: Arc<dyn Client> = Arc::new(
        DynamodbClient::builder()
            .await
            .endpoint_url(env::var(ENV_DYNAMODB_ENDPOINT_URL).ok())
            .build(),
    );
    let directory = Directory::new(client);

    match directory.list_streams(&table_name).await {
        Ok(stream_arns) if stream_arns.is_empty() => {
            info!("{table_name} has no streams");
        }
        Ok(stream_arns) => {
            for stream_arn in stream_arns {
                println!("{stream_arn}");
            }
        }
        Err(err) => {
            error!("{err}");
            return Err(err.into());
        }
    }

    Ok(())
}
