use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nend-to-end";

fn cli(server: &MockServer) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cyclemap-cli"));
    cmd.env("CYCLEMAP__RENDERER__ENDPOINT", server.url("/v1/staticmap"))
        .env("CYCLEMAP__RENDERER__API_KEY", "e2e-key")
        .env("CYCLEMAP__LOGGING__LEVEL", "warn")
        .env_remove("CYCLEMAP_CONFIG_FILE");
    cmd
}

#[test]
fn renders_a_map_end_to_end() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/route.geojson");
        then.status(200)
            .header("content-type", "application/geo+json")
            .body(r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"LineString","coordinates":[[4.89,52.37],[4.9,52.38]]}}]}"#);
    });
    let render = server.mock(|when, then| {
        when.method("POST")
            .path("/v1/staticmap")
            .query_param("apiKey", "e2e-key")
            .json_body_includes(
                r##"{"width":800,"height":600,"scaleFactor":1,"geojson":{"features":[{"properties":{"linecolor":"#ff920d"}}]}}"##,
            );
        then.status(200).header("content-type", "image/png").body(PNG);
    });

    let dir = tempfile::tempdir().expect("tmp dir");
    let output = dir.path().join("cycle_map.png");

    cli(&server)
        .arg("--url")
        .arg(server.url("/route.geojson"))
        .arg("--output")
        .arg(&output)
        .args(["--width", "800", "--height", "600", "--scale", "1"])
        .assert()
        .success()
        .stdout(contains("Map saved to"))
        .stdout(contains("800x600"));

    render.assert();
    assert_eq!(std::fs::read(&output).expect("image written"), PNG);
}

#[test]
fn missing_geojson_exits_with_status_one() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/missing.geojson");
        then.status(404);
    });

    let dir = tempfile::tempdir().expect("tmp dir");

    cli(&server)
        .arg("--url")
        .arg(server.url("/missing.geojson"))
        .arg("--output")
        .arg(dir.path().join("map.png"))
        .assert()
        .code(1)
        .stderr(contains("not found"));
}

#[test]
fn rejected_api_key_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/route.geojson");
        then.status(200).body(r#"{"type":"FeatureCollection","features":[]}"#);
    });
    server.mock(|when, then| {
        when.method("POST").path("/v1/staticmap");
        then.status(401);
    });

    let dir = tempfile::tempdir().expect("tmp dir");
    let output = dir.path().join("map.png");

    cli(&server)
        .arg("--url")
        .arg(server.url("/route.geojson"))
        .arg("--output")
        .arg(&output)
        .assert()
        .code(1)
        .stderr(contains("Invalid API key"));

    assert!(!output.exists());
}

#[test]
fn invalid_scale_fails_fast() {
    Command::new(assert_cmd::cargo::cargo_bin!("cyclemap-cli"))
        .args([
            "--url",
            "https://example.test/route.geojson",
            "--output",
            "map.png",
            "--scale",
            "4",
        ])
        .assert()
        .failure()
        .stderr(contains("--scale"));
}
