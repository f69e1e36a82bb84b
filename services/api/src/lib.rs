mod cli;
mod error;
mod infra;
mod report;
mod routes;
mod server;

pub use error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
