use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- hosted zones ---

#[tokio::test]
async fn hosted_zones_are_served_as_xml() {
    let resp = app().oneshot(get("/hostedzone")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );
    let xml = body_text(resp).await;
    assert!(xml.contains("<Id>/hostedzone/Z1PA6795UKMFR9</Id>"));
    assert!(xml.contains("<Name>denominator.io.</Name>"));
}

#[tokio::test]
async fn create_hosted_zone_answers_location_with_empty_body() {
    let resp = app()
        .oneshot(json_request("POST", "/hostedzone", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(
        resp.headers().get(http::header::LOCATION).unwrap(),
        "/hostedzone/Z1PA6795UKMFR9"
    );
    assert!(body_text(resp).await.is_empty());
}

// --- sessions ---

#[tokio::test]
async fn login_issues_a_token() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/Session",
            r#"{"customer_name":"denominator","user_name":"jclouds","password":"letmein"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["token"], "denominator:jclouds:token");
}

#[tokio::test]
async fn login_with_empty_password_is_unauthorized() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/Session",
            r#"{"customer_name":"denominator","user_name":"jclouds","password":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn zones_require_a_live_session() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/Zone")
                .header("Auth-Token", "stale-token")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // login
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/Session",
            r#"{"customer_name":"denominator","user_name":"jclouds","password":"letmein"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token = body_json(resp).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // zones with the token
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri("/Zone")
                .header("Auth-Token", &token)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let zones = body_json(resp).await;
    assert_eq!(zones["data"].as_array().unwrap().len(), 2);

    // records of one zone
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri("/AllRecord/zone1.denominator.io")
                .header("Auth-Token", &token)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let records = body_json(resp).await;
    assert!(records["data"][0]
        .as_str()
        .unwrap()
        .contains("zone1.denominator.io"));

    // logout
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri("/Session")
                .header("Auth-Token", &token)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // zones after logout — unauthorized
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .uri("/Zone")
                .header("Auth-Token", &token)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- missing ---

#[tokio::test]
async fn missing_returns_404_with_a_text_body() {
    let resp = app().oneshot(get("/missing")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(resp).await, "no such resource");
}
