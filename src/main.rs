use dynamo_tail::{
    config::Config,
    notification::{self, Event},
    watcher::WatchContext,
    web::{route::root, AppState, Entry, SharedState},
    Client, DynamodbClient,
};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::{
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::new();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::new();

    let client: Arc<dyn Client> = Arc::new(
        DynamodbClient::builder()
            .await
            .endpoint_url(config.endpoint_url())
            .build(),
    );

    let (tx, rx) = mpsc::channel::<Event>(100);
    tokio::spawn(async move {
        if let Err(err) = notification::start(rx).await {
            error!("{err}");
        }
    });

    let context = WatchContext::new(client, config.traversal(), tx);
    let mut state = AppState::new(context.clone());

    for entry_config in config.entries() {
        let mut entry = Entry::new(&entry_config.table_name, &entry_config.url);

        match context
            .start(&entry_config.table_name, &entry_config.url)
            .await
        {
            Ok(watch) => entry.start(watch),
            Err(err) => {
                error!("Failed to watch {}: {err}", entry_config.table_name);
                entry.fail(format!("{err}"));
            }
        }

        state.insert(ulid::Ulid::new().to_string(), entry);
    }

    let state: SharedState = state.into();

    let app = root::router(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(
                DefaultMakeSpan::new()
                    .level(Level::INFO)
                    .include_headers(true),
            )
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Micros)
                    .include_headers(true),
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    info!("listening on {addr}");

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {err}");
    }
    info!("Shutting down");
}
