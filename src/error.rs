/*
 * Responsibility
 * - 起動時エラー (listener bind / serve) の定義
 * - main() の戻り値として使う
 *
 * Filter parameters never produce an error here; see middleware::hsts.
 */
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}
