use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

use crate::{client::BackendClient, summary::Summary};

#[tracing::instrument(name = "Summarising transactions for /api/summary request", skip(client))]
#[get("/api/summary")]
pub async fn summary(client: web::Data<BackendClient>) -> impl Responder {
    match client.fetch_transactions(client.fetch_limit()).await {
        Ok(transactions) => HttpResponse::Ok().json(Summary::from_transactions(&transactions)),
        Err(e) => {
            tracing::error!("Failed to fetch transactions: {}", e);
            HttpResponse::BadGateway().json(json!({ "error": e.to_string() }))
        }
    }
}
