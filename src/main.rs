#![deny(unused_must_use)]

use foxnavy::{Builder, Config};

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    // A server that cannot verify sessions must not start
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            log::error!("Invalid configuration: {}", error);
            std::process::exit(1);
        }
    };

    for warning in config.warnings() {
        log::warn!("{}", warning);
    }

    let bind = config.bind;
    let builder = Builder::from_config(config);

    #[cfg(feature = "test-control")]
    let builder = {
        log::warn!("Test control enabled, POST /test/reset wipes lobby state");
        builder.with_test_control()
    };

    log::info!("Listening on {}", bind);
    warp::serve(builder.build()).run(bind).await;
}
