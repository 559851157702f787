use std::io::Write;

use super::*;

#[test]
fn defaults_match_the_poster_preset() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.style.color, "#ff920d");
    assert_eq!(settings.style.width, 3);
    assert_eq!(settings.style.opacity, 0.7);
    assert_eq!(settings.map.style, "klokantech-basic");
    assert_eq!(settings.map.scale_factor, ScaleFactor::Double);
    assert_eq!(settings.map.zoom, Some(10.5));
    assert_eq!(settings.map.pitch, Some(43.0));
    assert_eq!(settings.map.bearing, Some(163.0));
    assert!(settings.map.style_customization.is_empty());
    assert_eq!(settings.renderer.fetch_timeout, Duration::from_secs(30));
    assert_eq!(settings.renderer.render_timeout, Duration::from_secs(60));
    assert_eq!(
        settings.renderer.endpoint.as_str(),
        "https://maps.geoapify.com/v1/staticmap"
    );
    assert_eq!(
        settings.uploads.max_request_bytes.get(),
        DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES
    );
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        renderer: RendererOverrides {
            log_level: Some("debug".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn renderer_overrides_replace_endpoint_and_timeouts() {
    let mut raw = RawSettings::default();
    raw.apply_renderer_overrides(&RendererOverrides {
        endpoint: Some("http://127.0.0.1:9000/v1/staticmap".to_string()),
        api_key_file: Some(PathBuf::from("/run/secrets/geoapify")),
        fetch_timeout_seconds: Some(5),
        render_timeout_seconds: Some(7),
        log_level: None,
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.renderer.endpoint.as_str(),
        "http://127.0.0.1:9000/v1/staticmap"
    );
    assert_eq!(
        settings.renderer.api_key_file,
        PathBuf::from("/run/secrets/geoapify")
    );
    assert_eq!(settings.renderer.fetch_timeout, Duration::from_secs(5));
    assert_eq!(settings.renderer.render_timeout, Duration::from_secs(7));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_inline_api_key_is_ignored() {
    let mut raw = RawSettings::default();
    raw.renderer.api_key = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.renderer.api_key, None);
}

#[test]
fn rejects_out_of_range_values() {
    let mut raw = RawSettings::default();
    raw.map.scale = Some(3);
    let err = Settings::from_raw(raw).expect_err("scale 3 is invalid");
    assert!(matches!(err, LoadError::Invalid { key: "map.scale", .. }));

    let mut raw = RawSettings::default();
    raw.style.line_opacity = Some(1.5);
    let err = Settings::from_raw(raw).expect_err("opacity above one is invalid");
    assert!(matches!(err, LoadError::Invalid { key: "style.line_opacity", .. }));

    let mut raw = RawSettings::default();
    raw.renderer.render_timeout_seconds = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero timeout is invalid");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "renderer.render_timeout_seconds",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.renderer.endpoint = Some("not a url".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn config_file_supplies_style_and_customization() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tmp file");
    writeln!(
        file,
        r##"
[style]
line_color = "#00ff00"
line_width = 6

[map]
style = "osm-bright"
bearing = 180.0
style_customization = [{{ layer = "water", color = "#1e90ff" }}]
"##
    )
    .expect("write config");

    let settings = load_with_renderer_overrides(Some(file.path()), &RendererOverrides::default())
        .expect("valid settings");

    assert_eq!(settings.style.color, "#00ff00");
    assert_eq!(settings.style.width, 6);
    assert_eq!(settings.style.opacity, 0.7);
    assert_eq!(settings.map.style, "osm-bright");
    assert_eq!(settings.map.bearing, Some(180.0));
    assert_eq!(settings.map.style_customization.len(), 1);
    assert_eq!(settings.map.style_customization[0]["layer"], "water");
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["cyclemap"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "cyclemap",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--api-key-file",
        "/tmp/key",
        "--log-json=true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.renderer.api_key_file,
                Some(PathBuf::from("/tmp/key"))
            );
            assert_eq!(serve.overrides.log_json, Some(true));
        }
    }
}
