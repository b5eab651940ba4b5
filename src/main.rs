use std::{error::Error, sync::Arc};

use tokio::{fs, net, task};
use tracing::{error, info};
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use ticket_sphere::{db, server, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fs::read_to_string("config.toml").await?;
    let config = toml::from_str::<Config>(&config)?;

    let (db_client, db_connection) = db::connect(config.db).await?;

    // Once this task ends the client reports itself closed and every
    // request fails with `repo::Error::Unavailable`.
    task::spawn(async move {
        if let Err(e) = db_connection.await {
            error!(error = %e, "database connection failed");
        }
    });

    let state =
        server::AppState::new(Arc::new(db_client), config.admin, &config.jwt);
    let app = server::router(state, &config.http.cors)?;

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    info!(addr = %config.http.server.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
