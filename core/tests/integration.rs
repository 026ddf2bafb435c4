//! Full binding-and-call lifecycle against the live mock provider.
//!
//! # Design
//! Starts the mock server on a random port, then exercises bound clients
//! over real HTTP through the default transport: session login via a body
//! template, zone listing via a regex list decoder, record tables via
//! reordered capture groups, `Location` extraction for create calls, and
//! status-error classification for missing resources.

use std::net::SocketAddr;

use declient_core::{
    Api, Arg, Binder, Error, ErrorWire, JsonBodyEncoder, MethodSig, ParamSig, ReturnShape,
    StaticTarget, TextDecoder,
};

/// Start the mock provider on a random port and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn dynect_api() -> Api {
    Api::new("DynEct")
        .method(
            MethodSig::new("login")
                .post()
                .path("/Session")
                .produces("application/json")
                .body_template(concat!(
                    "%7B\"customer_name\": \"{customer_name}\", ",
                    "\"user_name\": \"{user_name}\", \"password\": \"{password}\"%7D",
                ))
                .regex("\"token\":\\s*\"([^\"]+)\"")
                .returns(ReturnShape::Scalar)
                .param(ParamSig::form("customer_name"))
                .param(ParamSig::form("user_name"))
                .param(ParamSig::form("password")),
        )
        .method(
            MethodSig::new("zones")
                .get()
                .path("/Zone")
                .regex("/REST/Zone/([^/]+)/")
                .returns(ReturnShape::List)
                .param(ParamSig::header("Auth-Token")),
        )
        .method(
            MethodSig::new("records")
                .get()
                .path("/AllRecord/{zone}")
                .regex_groups("/REST/([a-zA-Z]+)Record/([^/]+)/([^/]+)/([0-9]+)", &[4, 3, 1])
                .returns(ReturnShape::Table)
                .param(ParamSig::header("Auth-Token"))
                .param(ParamSig::path("zone")),
        )
        .method(
            MethodSig::new("logout")
                .delete()
                .path("/Session")
                .returns(ReturnShape::None)
                .param(ParamSig::header("Auth-Token")),
        )
}

fn route53_api() -> Api {
    Api::new("Route53")
        .method(
            MethodSig::new("name_to_ids")
                .get()
                .path("/hostedzone")
                .regex_groups("<Id>([^<]+)</Id><Name>([^<]+)</Name>", &[2, 1])
                .returns(ReturnShape::MultiMap),
        )
        .method(
            MethodSig::new("create_zone")
                .post()
                .path("/hostedzone")
                .returns(ReturnShape::Uri)
                .param(ParamSig::body().typed("CreateZone")),
        )
}

#[test]
fn session_zone_and_record_lifecycle() {
    let addr = start_server();
    let client = Binder::new()
        .bind(&dynect_api(), StaticTarget::new("DynEct", &format!("http://{addr}")))
        .unwrap();

    // Step 1: login through the body template; the scalar regex pulls the
    // token out of the JSON response.
    let token = client
        .call(
            "login",
            &[
                Arg::from("denominator"),
                Arg::from("jclouds"),
                Arg::from("letmein"),
            ],
        )
        .unwrap()
        .as_text()
        .unwrap()
        .to_string();
    assert_eq!(token, "denominator:jclouds:token");

    // Step 2: list zones with the session header.
    let zones = client
        .call("zones", &[Arg::from(token.clone())])
        .unwrap()
        .into_list()
        .unwrap();
    assert_eq!(zones, vec!["zone1.denominator.io", "zone2.denominator.io"]);

    // Step 3: record table for one zone, capture groups reordered to
    // (id, name, type).
    let records = client
        .call("records", &[Arg::from(token.clone()), Arg::from(zones[0].clone())])
        .unwrap()
        .into_table()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[&("52845188".to_string(), "zone1.denominator.io".to_string())],
        "SOA"
    );
    assert_eq!(
        records[&("53734845".to_string(), "www1.zone1.denominator.io".to_string())],
        "A"
    );

    // Step 4: logout discards the response body.
    assert!(client
        .call("logout", &[Arg::from(token.clone())])
        .unwrap()
        .is_none());

    // Step 5: the discarded session no longer lists zones.
    let err = client.call("zones", &[Arg::from(token)]).unwrap_err();
    match err {
        Error::Status { status, .. } => assert_eq!(status, 401),
        other => panic!("expected a status error, got {other}"),
    }
}

#[test]
fn hosted_zone_listing_decodes_to_a_multimap() {
    let addr = start_server();
    let client = Binder::new()
        .decoder("Route53#create_zone(CreateZone)", TextDecoder)
        .body_encoder("Route53", JsonBodyEncoder)
        .bind(&route53_api(), StaticTarget::new("Route53", &format!("http://{addr}")))
        .unwrap();

    let pairs = client
        .call("name_to_ids", &[])
        .unwrap()
        .into_multimap()
        .unwrap();
    assert_eq!(
        pairs,
        vec![
            (
                "denominator.io.".to_string(),
                "/hostedzone/Z1PA6795UKMFR9".to_string()
            ),
            (
                "denominator.io.".to_string(),
                "/hostedzone/Z3OQLQGABCU3T2".to_string()
            ),
            (
                "example.com.".to_string(),
                "/hostedzone/Z21WMW87WT2HLL".to_string()
            ),
        ]
    );
}

#[test]
fn create_answers_with_the_location_header_as_uri() {
    #[derive(serde::Serialize)]
    struct CreateZone {
        name: String,
    }

    let addr = start_server();
    let client = Binder::new()
        .decoder("Route53#create_zone(CreateZone)", TextDecoder)
        .body_encoder("Route53", JsonBodyEncoder)
        .bind(&route53_api(), StaticTarget::new("Route53", &format!("http://{addr}")))
        .unwrap();

    let body = Arg::json_of(&CreateZone {
        name: "denominator.io.".to_string(),
    })
    .unwrap();
    let uri = client.call("create_zone", &[body]).unwrap();
    assert_eq!(uri.as_uri(), Some("/hostedzone/Z1PA6795UKMFR9"));
}

#[test]
fn missing_resource_raises_a_status_error_with_context() {
    let api = Api::new("Route53").method(
        MethodSig::new("missing")
            .get()
            .path("/missing")
            .returns(ReturnShape::None),
    );

    let addr = start_server();
    let client = Binder::new()
        .bind(&api, StaticTarget::new("Route53", &format!("http://{addr}")))
        .unwrap();

    let err = client.call("missing", &[]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("status 404"));
    assert!(message.contains(&format!("GET http://{addr}/missing")));
    assert!(message.contains("no such resource"));
}

#[test]
fn wire_logging_rebuffers_without_breaking_decoding() {
    let addr = start_server();
    let client = Binder::new()
        .wire(ErrorWire)
        .bind(&dynect_api(), StaticTarget::new("DynEct", &format!("http://{addr}")))
        .unwrap();

    let token = client
        .call(
            "login",
            &[
                Arg::from("denominator"),
                Arg::from("jclouds"),
                Arg::from("letmein"),
            ],
        )
        .unwrap()
        .as_text()
        .unwrap()
        .to_string();
    let zones = client
        .call("zones", &[Arg::from(token)])
        .unwrap()
        .into_list()
        .unwrap();
    assert_eq!(zones.len(), 2);
}

#[test]
fn method_level_decoder_override_bypasses_the_regex_hint() {
    let addr = start_server();
    let client = Binder::new()
        .decoder("DynEct#zones(String)", TextDecoder)
        .bind(&dynect_api(), StaticTarget::new("DynEct", &format!("http://{addr}")))
        .unwrap();

    let token = client
        .call(
            "login",
            &[
                Arg::from("denominator"),
                Arg::from("jclouds"),
                Arg::from("letmein"),
            ],
        )
        .unwrap()
        .as_text()
        .unwrap()
        .to_string();

    // the override returns the raw JSON instead of the decoded list
    let raw = client.call("zones", &[Arg::from(token)]).unwrap();
    let text = raw.as_text().unwrap();
    assert!(text.contains("/REST/Zone/zone1.denominator.io/"));
    assert!(text.starts_with('{'));
}
