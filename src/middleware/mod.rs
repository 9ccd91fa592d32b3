/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 各 module の apply(router, ...) を app.rs から呼ぶ
 */
pub mod hsts;
pub mod http;
