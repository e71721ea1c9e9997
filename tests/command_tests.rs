use pretty_assertions::assert_eq;
use sigrok_cli::commands::{execute, select_channels, CliArgs, Outcome};
use sigrok_cli::sigrok::builtin::{BuiltinContext, DemoDevice};
use sigrok_cli::sigrok::Device;
use sigrok_cli::utils::{CliError, SrError};
use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

fn run(args: &CliArgs) -> (anyhow::Result<Outcome>, String) {
    let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
    let result = execute(args, &BuiltinContext::new(), buffer.clone());
    let text = String::from_utf8(buffer.borrow().clone()).unwrap();
    (result, text)
}

/// Demo device with two logic channels and no analog channels
fn two_channel_demo() -> Option<String> {
    Some("demo:num_logic_channels=2:num_analog_channels=0".to_string())
}

#[test]
fn test_version_lists_capabilities() {
    let args = CliArgs {
        version: true,
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::VersionShown);
    assert!(text.contains("Supported hardware drivers:"));
    assert!(text.contains("Supported input formats:"));
    assert!(text.contains("Supported output formats:"));
}

#[test]
fn test_scan_without_driver_uses_every_driver() {
    let args = CliArgs {
        scan: true,
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Scanned { devices: 1 });
    assert_eq!(
        text,
        "demo - Demo Demo device with 9 channels: D0 D1 D2 D3 D4 D5 D6 D7 A0\n"
    );
}

#[test]
fn test_scan_with_driver_options() {
    let args = CliArgs {
        scan: true,
        driver: two_channel_demo(),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Scanned { devices: 1 });
    assert_eq!(text, "demo - Demo Demo device with 2 channels: D0 D1\n");
}

#[test]
fn test_scan_with_unknown_option_key() {
    let args = CliArgs {
        scan: true,
        driver: Some("demo:frobnicate=1".to_string()),
        ..Default::default()
    };
    let (result, _) = run(&args);

    assert!(matches!(
        result.unwrap_err().downcast_ref::<SrError>(),
        Some(SrError::UnknownConfigKey(key)) if key == "frobnicate"
    ));
}

#[test]
fn test_capture_samples_as_bits() {
    let args = CliArgs {
        driver: two_channel_demo(),
        samples: Some("8".to_string()),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Captured);
    assert_eq!(text, "D0:01010101\nD1:00110011\n");
}

#[test]
fn test_capture_time_limit_uses_samplerate() {
    let args = CliArgs {
        driver: two_channel_demo(),
        time: Some("8".to_string()),
        config: Some("samplerate=1k".to_string()),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Captured);
    assert_eq!(text, "D0:01010101\nD1:00110011\n");
}

#[test]
fn test_capture_frames() {
    let args = CliArgs {
        driver: two_channel_demo(),
        samples: Some("2".to_string()),
        frames: Some("2".to_string()),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Captured);
    assert_eq!(text, "D0:01\nD1:00\nD0:01\nD1:11\n");
}

#[test]
fn test_capture_selected_channels_only() {
    let args = CliArgs {
        driver: two_channel_demo(),
        samples: Some("8".to_string()),
        channels: Some("D1".to_string()),
        ..Default::default()
    };
    let (_, text) = run(&args);

    assert_eq!(text, "D1:00110011\n");
}

#[test]
fn test_capture_config_pattern() {
    let args = CliArgs {
        driver: two_channel_demo(),
        samples: Some("4".to_string()),
        config: Some("pattern=all-high".to_string()),
        output_format: "hex".to_string(),
        ..Default::default()
    };
    let (_, text) = run(&args);

    assert_eq!(text, "D0:f0\nD1:f0\n");
}

#[test]
fn test_capture_wavedrom() {
    let args = CliArgs {
        driver: Some("demo:num_logic_channels=1:num_analog_channels=0".to_string()),
        samples: Some("4".to_string()),
        output_format: "wavedrom".to_string(),
        ..Default::default()
    };
    let (_, text) = run(&args);

    assert_eq!(text, "{\"signal\":[{\"name\":\"D0\",\"wave\":\"0101\"}]}\n");
}

#[test]
fn test_capture_analog() {
    let args = CliArgs {
        driver: Some("demo:num_logic_channels=0:num_analog_channels=1".to_string()),
        samples: Some("2".to_string()),
        config: Some("amplitude=2.5".to_string()),
        output_format: "analog".to_string(),
        ..Default::default()
    };
    let (_, text) = run(&args);

    assert_eq!(text, "A0: 2.500000 V\nA0: 2.500000 V\n");
}

#[test]
fn test_set_applies_config_without_session() {
    let args = CliArgs {
        driver: two_channel_demo(),
        set: true,
        config: Some("samplerate=1M:pattern=walking-one".to_string()),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Configured);
    assert!(text.is_empty());
}

#[test]
fn test_set_rejects_bad_config_value() {
    let args = CliArgs {
        driver: two_channel_demo(),
        set: true,
        config: Some("pattern=plaid".to_string()),
        ..Default::default()
    };
    let (result, _) = run(&args);

    assert!(matches!(
        result.unwrap_err().downcast_ref::<SrError>(),
        Some(SrError::InvalidValue { .. })
    ));
}

#[test]
fn test_malformed_config_pair() {
    let args = CliArgs {
        driver: two_channel_demo(),
        set: true,
        config: Some("samplerate".to_string()),
        ..Default::default()
    };
    let (result, _) = run(&args);

    assert!(matches!(
        result.unwrap_err().downcast_ref::<CliError>(),
        Some(CliError::InvalidPair(_))
    ));
}

#[test]
fn test_input_file_autodetected_csv() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "a,b\n1,0\n0,1\n1,1\n").unwrap();

    let args = CliArgs {
        input_file: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Captured);
    assert_eq!(text, "a:101\nb:011\n");
}

#[test]
fn test_input_file_hash_comments() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "# exported by scope\na,b\n# trigger here\n1,0\n0,1\n").unwrap();

    let args = CliArgs {
        input_file: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Captured);
    assert_eq!(text, "a:10\nb:01\n");
}

#[test]
fn test_input_file_wide_csv() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(
        file,
        "1,0,0,0,0,0,0,0,0,1\n0,0,0,0,0,0,0,0,0,1\n1,0,0,0,0,0,0,0,0,0\n"
    )
    .unwrap();

    let bits = CliArgs {
        input_file: Some(file.path().to_path_buf()),
        channels: Some("CH1,CH10".to_string()),
        ..Default::default()
    };
    let (result, text) = run(&bits);
    assert_eq!(result.unwrap(), Outcome::Captured);
    assert_eq!(text, "CH1:101\nCH10:110\n");

    let hex = CliArgs {
        output_format: "hex".to_string(),
        ..bits
    };
    let (result, text) = run(&hex);
    assert_eq!(result.unwrap(), Outcome::Captured);
    assert_eq!(text, "CH1:a0\nCH10:c0\n");
}

#[test]
fn test_input_file_duplicate_channel_names() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "a,a,b\n1,1,0\n0,1,1\n").unwrap();

    let args = CliArgs {
        input_file: Some(file.path().to_path_buf()),
        channels: Some("b".to_string()),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert!(matches!(
        result.unwrap_err().downcast_ref::<SrError>(),
        Some(SrError::InvalidInput(msg)) if msg.contains("duplicate")
    ));
    assert!(text.is_empty());
}

#[test]
fn test_input_file_set_skips_session() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "a,b\n1,0\n").unwrap();

    let args = CliArgs {
        input_file: Some(file.path().to_path_buf()),
        channels: Some("a".to_string()),
        set: true,
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Configured);
    assert!(text.is_empty());
}

#[test]
fn test_input_file_explicit_binary_format() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0xff, 0x00]).unwrap();

    let args = CliArgs {
        input_file: Some(file.path().to_path_buf()),
        input_format: Some("binary".to_string()),
        channels: Some("D0".to_string()),
        output_format: "hex".to_string(),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert_eq!(result.unwrap(), Outcome::Captured);
    assert_eq!(text, "D0:80\n");
}

#[test]
fn test_input_file_unrecognised_format() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let args = CliArgs {
        input_file: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let (result, text) = run(&args);

    assert!(matches!(
        result.unwrap_err().downcast_ref::<CliError>(),
        Some(CliError::UnrecognisedInputFormat)
    ));
    assert!(text.is_empty());
}

#[test]
fn test_input_file_unknown_format_name() {
    let args = CliArgs {
        input_file: Some(PathBuf::from("capture.csv")),
        input_format: Some("vcd".to_string()),
        ..Default::default()
    };
    let (result, _) = run(&args);

    assert!(matches!(
        result.unwrap_err().downcast_ref::<CliError>(),
        Some(CliError::UnknownInputFormat(name)) if name == "vcd"
    ));
}

#[test]
fn test_select_channels_enables_exactly_named() {
    let device = DemoDevice::new(8, 1);
    select_channels(&device, "D2,A0").unwrap();

    let enabled: Vec<String> = device
        .channels()
        .into_iter()
        .filter(|c| c.enabled)
        .map(|c| c.name)
        .collect();
    assert_eq!(enabled, vec!["D2", "A0"]);
}

#[test]
fn test_select_channels_ignores_unknown_names() {
    let device = DemoDevice::new(2, 0);
    select_channels(&device, "D1,X7").unwrap();

    let enabled: Vec<bool> = device.channels().iter().map(|c| c.enabled).collect();
    assert_eq!(enabled, vec![false, true]);
}
