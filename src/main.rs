use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::{error, info};
use std::io;
use whatsapp_webhook::config::Config;
use whatsapp_webhook::routes::{self, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, err.to_string()));
        }
    };

    let address = (config.host.clone(), config.port);
    let state = web::Data::new(AppState::new(config));

    info!("Listening on {}:{}", address.0, address.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%U"))
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await
}
