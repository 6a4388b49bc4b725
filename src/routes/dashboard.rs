use actix_web::{get, http::header::ContentType, web, HttpResponse, Responder};

use crate::{
    client::{BackendClient, DashboardData},
    render::DashboardPage,
};

#[tracing::instrument(name = "Rendering dashboard for / request", skip(client))]
#[get("/")]
pub async fn dashboard(client: web::Data<BackendClient>) -> impl Responder {
    let page = load_page(&client).await;

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page.render())
}

/// Fetches fresh data for a page. A failed fetch still yields a page, with
/// empty lists and the error message in the banner.
pub(crate) async fn load_page(client: &BackendClient) -> DashboardPage {
    match client.fetch_dashboard().await {
        Ok(data) => DashboardPage::new(data, None),
        Err(e) => {
            tracing::error!("Failed to load dashboard data: {}", e);
            DashboardPage::new(DashboardData::default(), Some(e.to_string()))
        }
    }
}
