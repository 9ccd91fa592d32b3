/*
 * Responsibility
 * - GET /api/v1/health
 * - 何もヘッダを付けない素の 200 を返す。Strict-Transport-Security が付くかどうかは
 *   外側の hsts middleware だけで決まるので、デプロイ後の確認用に使える
 *   (ex: curl -sI http://localhost:3000/api/v1/health | grep -i strict)
 */
use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body, json!({"status": "ok"}));
    }
}
