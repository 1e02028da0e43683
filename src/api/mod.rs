use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    FitOutField, FitOutInput, FitOutMode, FitOutReconciler, LeaseParameters, LeaseResult,
    WaterfallStep, evaluate_with, non_negative, parse_decimal, waterfall,
};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Not found")]
    NotFound,
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        };
        json_response(
            status,
            ErrorResponse {
                error: self.to_string(),
            },
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFitOutMode {
    PerNetArea,
    PerGrossArea,
    Total,
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<CliFitOutMode> for FitOutMode {
    fn from(value: CliFitOutMode) -> Self {
        match value {
            CliFitOutMode::PerNetArea => FitOutMode::PerNetArea,
            CliFitOutMode::PerGrossArea => FitOutMode::PerGrossArea,
            CliFitOutMode::Total => FitOutMode::Total,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFitOutMode {
    #[serde(alias = "perNetArea", alias = "per_net_area", alias = "nla")]
    PerNetArea,
    #[serde(alias = "perGrossArea", alias = "per_gross_area", alias = "gla")]
    PerGrossArea,
    Total,
}

impl From<ApiFitOutMode> for CliFitOutMode {
    fn from(value: ApiFitOutMode) -> Self {
        match value {
            ApiFitOutMode::PerNetArea => CliFitOutMode::PerNetArea,
            ApiFitOutMode::PerGrossArea => CliFitOutMode::PerGrossArea,
            ApiFitOutMode::Total => CliFitOutMode::Total,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFitOutField {
    #[serde(alias = "perNetArea", alias = "per_net_area")]
    PerNetArea,
    #[serde(alias = "perGrossArea", alias = "per_gross_area")]
    PerGrossArea,
    Total,
}

impl From<ApiFitOutField> for FitOutField {
    fn from(value: ApiFitOutField) -> Self {
        match value {
            ApiFitOutField::PerNetArea => FitOutField::PerNetArea,
            ApiFitOutField::PerGrossArea => FitOutField::PerGrossArea,
            ApiFitOutField::Total => FitOutField::Total,
        }
    }
}

/// A number as the browser sends it: either already numeric or the raw text
/// of an input box (`"1.234,5"`, `"150"`, `""`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    fn resolve(&self) -> f64 {
        match self {
            NumericInput::Number(v) => non_negative(*v),
            NumericInput::Text(text) => parse_decimal(text),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NerPayload {
    #[serde(alias = "nla")]
    net_area: Option<NumericInput>,
    #[serde(alias = "addon")]
    add_on_percent: Option<NumericInput>,
    #[serde(alias = "rent")]
    headline_rent: Option<NumericInput>,
    #[serde(alias = "duration")]
    lease_term_months: Option<NumericInput>,
    #[serde(alias = "rf")]
    rent_free_months: Option<NumericInput>,
    agent_fee_months: Option<NumericInput>,
    unforeseen_costs: Option<NumericInput>,

    fit_out_mode: Option<ApiFitOutMode>,
    #[serde(alias = "fitOut")]
    fit_out_per_net_area: Option<NumericInput>,
    fit_out_per_gross_area: Option<NumericInput>,
    fit_out_total: Option<NumericInput>,
    focus_field: Option<ApiFitOutField>,
}

#[derive(Parser, Debug)]
#[command(
    name = "ner",
    about = "Net effective rent calculator (rent-free, fit-out, agent fees, unforeseen costs)"
)]
struct Cli {
    #[arg(long, default_value_t = 1000.0, help = "Net lettable area (sqm)")]
    net_area: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Add-on factor for common areas in percent"
    )]
    add_on_percent: f64,
    #[arg(
        long,
        default_value_t = 13.0,
        help = "Headline rent per sqm of gross area per month"
    )]
    headline_rent: f64,
    #[arg(long, default_value_t = 84.0, help = "Lease term in months")]
    lease_term_months: f64,
    #[arg(long, default_value_t = 7.0, help = "Rent-free period in months")]
    rent_free_months: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliFitOutMode::PerNetArea,
        help = "Which fit-out figure is authoritative"
    )]
    fit_out_mode: CliFitOutMode,
    #[arg(long, default_value_t = 150.0, help = "Fit-out contribution per sqm of net area")]
    fit_out_per_net_area: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Fit-out contribution per sqm of gross area"
    )]
    fit_out_per_gross_area: f64,
    #[arg(long, default_value_t = 0.0, help = "Total fit-out contribution")]
    fit_out_total: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Agent fee as months of headline rent"
    )]
    agent_fee_months: f64,
    #[arg(long, default_value_t = 0.0, help = "Lump-sum unforeseen costs")]
    unforeseen_costs: f64,
}

#[derive(Debug, Clone, Copy)]
struct ApiRequest {
    params: LeaseParameters,
    fit_out: FitOutInput,
    focus: Option<FitOutField>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NerResponse {
    fit_out: FitOutInput,
    result: LeaseResult,
    waterfall: Vec<WaterfallStep>,
    share_query: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(cli: Cli) -> ApiRequest {
    let params = LeaseParameters {
        net_area: cli.net_area,
        add_on_percent: cli.add_on_percent,
        headline_rent: cli.headline_rent,
        lease_term_months: cli.lease_term_months,
        rent_free_months: cli.rent_free_months,
        agent_fee_months: cli.agent_fee_months,
        unforeseen_costs: cli.unforeseen_costs,
    }
    .normalized();
    let fit_out = FitOutReconciler::new(FitOutInput {
        mode: cli.fit_out_mode.into(),
        per_net_area_rate: cli.fit_out_per_net_area,
        per_gross_area_rate: cli.fit_out_per_gross_area,
        total_amount: cli.fit_out_total,
    })
    .snapshot();

    ApiRequest {
        params,
        fit_out,
        focus: None,
    }
}

/// One-shot computation for the command line. Returns the response JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let response = build_ner_response(&build_request(cli));
    Ok(serde_json::to_string_pretty(&response)?)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "NER HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/ner");

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route("/api/ner", get(ner_get_handler).post(ner_post_handler))
        .fallback(not_found_handler)
}

async fn not_found_handler() -> Response {
    ApiError::NotFound.into_response()
}

async fn ner_get_handler(payload: Result<Query<NerPayload>, QueryRejection>) -> Response {
    ner_handler_impl(payload.map(|Query(p)| p).map_err(ApiError::from)).await
}

async fn ner_post_handler(payload: Result<Json<NerPayload>, JsonRejection>) -> Response {
    ner_handler_impl(payload.map(|Json(p)| p).map_err(ApiError::from)).await
}

async fn ner_handler_impl(payload: Result<NerPayload, ApiError>) -> Response {
    match payload.and_then(api_request_from_payload) {
        Ok(request) => json_response(StatusCode::OK, build_ner_response(&request)),
        Err(err) => {
            warn!(error = %err, "rejected NER request");
            err.into_response()
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, ApiError> {
    let payload = serde_json::from_str::<NerPayload>(json)
        .map_err(|e| ApiError::BadRequest(format!("Invalid API JSON payload: {e}")))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: NerPayload) -> Result<ApiRequest, ApiError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.net_area {
        cli.net_area = v.resolve();
    }
    if let Some(v) = payload.add_on_percent {
        cli.add_on_percent = v.resolve();
    }
    if let Some(v) = payload.headline_rent {
        cli.headline_rent = v.resolve();
    }
    if let Some(v) = payload.lease_term_months {
        cli.lease_term_months = v.resolve();
    }
    if let Some(v) = payload.rent_free_months {
        cli.rent_free_months = v.resolve();
    }
    if let Some(v) = payload.agent_fee_months {
        cli.agent_fee_months = v.resolve();
    }
    if let Some(v) = payload.unforeseen_costs {
        cli.unforeseen_costs = v.resolve();
    }

    if let Some(v) = payload.fit_out_mode {
        cli.fit_out_mode = v.into();
    }
    if let Some(v) = payload.fit_out_per_net_area {
        cli.fit_out_per_net_area = v.resolve();
    }
    if let Some(v) = payload.fit_out_per_gross_area {
        cli.fit_out_per_gross_area = v.resolve();
    }
    if let Some(v) = payload.fit_out_total {
        cli.fit_out_total = v.resolve();
    }

    let mut request = build_request(cli);
    if let Some(field) = payload.focus_field {
        let field = FitOutField::from(field);
        if field != request.fit_out.mode.authoritative_field() {
            return Err(ApiError::BadRequest(
                "focusField must name the authoritative fit-out field for fitOutMode".to_string(),
            ));
        }
        request.focus = Some(field);
    }

    Ok(request)
}

fn default_cli_for_api() -> Cli {
    Cli {
        net_area: 1_000.0,
        add_on_percent: 5.0,
        headline_rent: 13.0,
        lease_term_months: 84.0,
        rent_free_months: 7.0,
        fit_out_mode: CliFitOutMode::PerNetArea,
        fit_out_per_net_area: 150.0,
        fit_out_per_gross_area: 0.0,
        fit_out_total: 0.0,
        agent_fee_months: 4.0,
        unforeseen_costs: 0.0,
    }
}

fn build_ner_response(request: &ApiRequest) -> NerResponse {
    let mut reconciler = FitOutReconciler::new(request.fit_out);
    reconciler.set_focus(request.focus);
    let (result, fit_out) = evaluate_with(&request.params, &mut reconciler);

    debug!(
        target: "ner.engine",
        gross_area = result.gross_area,
        total_fit_out = result.total_fit_out_cost,
        ner1 = result.tiers.ner1,
        ner4 = result.tiers.ner4,
        "computed net effective rent"
    );

    NerResponse {
        fit_out,
        waterfall: waterfall(&result, request.params.headline_rent),
        share_query: share_query(&request.params, &fit_out),
        result,
    }
}

fn fit_out_mode_key(mode: FitOutMode) -> &'static str {
    match mode {
        FitOutMode::PerNetArea => "per-net-area",
        FitOutMode::PerGrossArea => "per-gross-area",
        FitOutMode::Total => "total",
    }
}

/// Query string that reproduces the same calculation through `GET /api/ner`.
fn share_query(params: &LeaseParameters, fit_out: &FitOutInput) -> String {
    format!(
        "netArea={}&addOnPercent={}&headlineRent={}&leaseTermMonths={}&rentFreeMonths={}\
         &agentFeeMonths={}&unforeseenCosts={}&fitOutMode={}&fitOutPerNetArea={}\
         &fitOutPerGrossArea={}&fitOutTotal={}",
        params.net_area,
        params.add_on_percent,
        params.headline_rent,
        params.lease_term_months,
        params.rent_free_months,
        params.agent_fee_months,
        params.unforeseen_costs,
        fit_out_mode_key(fit_out.mode),
        fit_out.per_net_area_rate,
        fit_out.per_gross_area_rate,
        fit_out.total_amount,
    )
}
