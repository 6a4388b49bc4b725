use actix_web::{http::header::ContentType, post, web, HttpResponse, Responder};
use uuid::Uuid;

use crate::{
    client::BackendClient,
    model::{NewTransaction, SimulatorForm, SubmitOutcome},
};

use super::dashboard::load_page;

#[tracing::instrument(
    name = "Simulating transaction for /simulate request",
    skip(client, form),
    fields(submission_id = %Uuid::new_v4())
)]
#[post("/simulate")]
pub async fn simulate(
    client: web::Data<BackendClient>,
    form: web::Form<SimulatorForm>,
) -> impl Responder {
    let form = form.into_inner();

    let outcome = match NewTransaction::try_from(form.clone()) {
        Ok(transaction) => match client.submit_transaction(&transaction).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Submission failed: {}", e);
                SubmitOutcome::Rejected {
                    error: e.to_string(),
                }
            }
        },
        Err(error) => {
            tracing::warn!("Rejected simulator input: {}", error);
            SubmitOutcome::Rejected { error }
        }
    };

    let page = load_page(&client).await.with_submission(form, outcome);

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page.render())
}
