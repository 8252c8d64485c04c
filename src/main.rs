mod cli;
mod commands;
mod env_loader;
mod error;
mod folio;
mod logging;

use crate::error::RegistryError;

fn main() {
    env_loader::load_dotenv();

    if let Err(err) = cli::run() {
        match err.downcast_ref::<RegistryError>() {
            Some(registry_err) => eprintln!("error[{}]: {err:#}", registry_err.code().as_str()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
