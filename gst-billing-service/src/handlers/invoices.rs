use crate::dtos::{LedgerEntryResponse, SaveInvoiceRequest};
use crate::error::InvoiceError;
use crate::models::{InvoiceHeader, LedgerRow};
use crate::services::{compute_totals, output_file_name, XLSX_CONTENT_TYPE};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use metrics::counter;
use service_core::error::AppError;

/// `POST /save_invoice`: compute totals, record the invoice in the ledger,
/// fill the template and send the filled workbook back as a download.
///
/// A ledger row that was written stays written even if the template step
/// fails afterwards.
pub async fn save_invoice(
    State(state): State<AppState>,
    payload: Result<Json<SaveInvoiceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|e| {
        tracing::warn!(error = %e.body_text(), "Rejected invoice payload");
        AppError::from(e)
    })?;

    let (inv_num, bytes) = match process_invoice(&state, req).await {
        Ok(done) => done,
        Err(e) => {
            counter!("invoice_failures_total", "stage" => e.kind()).increment(1);
            tracing::error!(stage = e.kind(), error = %e, "Invoice request failed");
            return Err(e.into());
        }
    };

    counter!("invoices_saved_total").increment(1);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output_file_name(&inv_num)),
            ),
        ],
        bytes,
    ))
}

async fn process_invoice(
    state: &AppState,
    req: SaveInvoiceRequest,
) -> Result<(String, Vec<u8>), InvoiceError> {
    let (details, items) = req.into_parts()?;
    let totals = compute_totals(&items)?;
    let header = InvoiceHeader::new(details, totals);

    tracing::info!(
        inv_num = %header.inv_num(),
        items = items.len(),
        total = %totals.total_invoice_amount,
        "Saving invoice"
    );

    let row = state.ledger.append(LedgerRow::new(&header, &items)).await?;

    let filler = state.filler.clone();
    let inv_num = header.inv_num().to_string();
    // The response carries this request's own rendering, not whatever a
    // concurrent save of the same number left on disk.
    let filled = tokio::task::spawn_blocking(move || filler.fill(&header, &items))
        .await
        .map_err(|e| InvoiceError::Generation(anyhow::anyhow!("invoice task failed: {}", e)))??;

    tracing::info!(
        inv_num = %inv_num,
        row,
        size = filled.bytes.len(),
        "Invoice saved"
    );

    Ok((inv_num, filled.bytes))
}

/// `GET /invoices`: every ledger row in sheet order.
pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<LedgerEntryResponse>>, AppError> {
    let rows = state.ledger.rows().await?;

    Ok(Json(
        rows.into_iter().map(LedgerEntryResponse::from).collect(),
    ))
}

/// `GET /invoices/:inv_num`: every row carrying that number, since numbers
/// are not unique.
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(inv_num): Path<String>,
) -> Result<Json<Vec<LedgerEntryResponse>>, AppError> {
    let matching: Vec<LedgerEntryResponse> = state
        .ledger
        .rows()
        .await?
        .into_iter()
        .filter(|row| row.details.inv_num == inv_num)
        .map(LedgerEntryResponse::from)
        .collect();

    if matching.is_empty() {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Invoice {} not found",
            inv_num
        )));
    }

    Ok(Json(matching))
}
