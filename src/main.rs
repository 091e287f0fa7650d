use actix_web::{App, HttpServer, rt, web};
use dotenvy::dotenv;
use log::{info, warn};

use proof_chain::api::{self, AppState};
use proof_chain::config::ServerConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let ServerConfig { host, port } = ServerConfig::from_env();

    // One engine for the lifetime of the process.
    let state = web::Data::new(AppState::default());
    info!("⛓️ Starting blockchain API at http://{host}:{port}");

    let app_state = state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(api::init_routes)
    })
    .disable_signals()
    .bind((host.as_str(), port))?
    .run();

    // Ctrl-C: cancel in-flight proof searches first, then stop gracefully.
    let handle = server.handle();
    rt::spawn(async move {
        match rt::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested, cancelling mining");
                state.begin_shutdown();
                handle.stop(true).await;
            }
            Err(e) => warn!("failed to listen for ctrl-c: {e}"),
        }
    });

    server.await
}
