/*
 * Responsibility
 * - tokio runtime の起動
 * - app::run() の呼び出し（ロジックは置かない）
 */
mod api;
mod app;
mod config;
mod error;
mod middleware;
mod state;

use crate::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    app::run().await
}
