//! In-process DNS-provider-flavored HTTP server used by integration tests.
//!
//! Serves the response formats the bound clients decode in tests: a
//! Route53-style XML zone listing, DynECT-style JSON resource references
//! behind a session token, and a create endpoint answering with a
//! `Location` header and no body.

use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Deserialize)]
pub struct Login {
    pub customer_name: String,
    pub user_name: String,
    pub password: String,
}

pub type Sessions = Arc<RwLock<HashSet<String>>>;

/// Route53-style hosted zone listing.
pub fn hosted_zones_xml() -> String {
    concat!(
        "<ListHostedZonesResponse xmlns=\"https://route53.amazonaws.com/doc/2012-12-12/\">",
        "<HostedZones>",
        "<HostedZone><Id>/hostedzone/Z1PA6795UKMFR9</Id><Name>denominator.io.</Name></HostedZone>",
        "<HostedZone><Id>/hostedzone/Z3OQLQGABCU3T2</Id><Name>denominator.io.</Name></HostedZone>",
        "<HostedZone><Id>/hostedzone/Z21WMW87WT2HLL</Id><Name>example.com.</Name></HostedZone>",
        "</HostedZones>",
        "</ListHostedZonesResponse>",
    )
    .to_string()
}

/// DynECT-style zone reference listing.
pub fn zone_refs_json() -> Value {
    json!({
        "status": "success",
        "data": ["/REST/Zone/zone1.denominator.io/", "/REST/Zone/zone2.denominator.io/"],
        "job_id": 368_433_320,
    })
}

/// DynECT-style record reference listing for one zone.
pub fn record_refs_json(zone: &str) -> Value {
    json!({
        "status": "success",
        "data": [
            format!("/REST/SOARecord/{zone}/{zone}/52845188"),
            format!("/REST/ARecord/{zone}/www1.{zone}/53734845"),
        ],
        "job_id": 368_433_330,
    })
}

pub fn app() -> Router {
    let sessions: Sessions = Arc::new(RwLock::new(HashSet::new()));
    Router::new()
        .route("/hostedzone", get(list_hosted_zones).post(create_hosted_zone))
        .route("/Session", post(open_session).delete(close_session))
        .route("/Zone", get(list_zones))
        .route("/AllRecord/{zone}", get(list_records))
        .route("/missing", get(missing))
        .with_state(sessions)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_hosted_zones() -> ([(header::HeaderName, &'static str); 1], String) {
    ([(header::CONTENT_TYPE, "text/xml")], hosted_zones_xml())
}

async fn create_hosted_zone() -> (StatusCode, [(header::HeaderName, &'static str); 1]) {
    (
        StatusCode::CREATED,
        [(header::LOCATION, "/hostedzone/Z1PA6795UKMFR9")],
    )
}

async fn open_session(
    State(sessions): State<Sessions>,
    Json(login): Json<Login>,
) -> Result<Json<Value>, StatusCode> {
    if login.password.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let token = format!("{}:{}:token", login.customer_name, login.user_name);
    sessions.write().await.insert(token.clone());
    Ok(Json(json!({
        "status": "success",
        "data": { "token": token, "version": "3.5.8" },
    })))
}

async fn close_session(
    State(sessions): State<Sessions>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let token = auth_token(&headers)?;
    if !sessions.write().await.remove(&token) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({"status": "success", "data": {}})))
}

async fn list_zones(
    State(sessions): State<Sessions>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    require_session(&sessions, &headers).await?;
    Ok(Json(zone_refs_json()))
}

async fn list_records(
    State(sessions): State<Sessions>,
    Path(zone): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    require_session(&sessions, &headers).await?;
    Ok(Json(record_refs_json(&zone)))
}

async fn missing() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "no such resource")
}

fn auth_token(headers: &HeaderMap) -> Result<String, StatusCode> {
    headers
        .get("Auth-Token")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)
}

async fn require_session(sessions: &Sessions, headers: &HeaderMap) -> Result<(), StatusCode> {
    let token = auth_token(headers)?;
    if sessions.read().await.contains(&token) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
