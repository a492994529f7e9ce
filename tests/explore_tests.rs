use std::fs;

use alsa_explore::catalog::SampleEncoding;
use alsa_explore::core::DeviceEnumerator;
use alsa_explore::probe::DeviceVerdict;
use alsa_explore::report::{
    AccessibilityReport, DeviceTarget, Explorer, ReportOptions, enumerate_targets,
};
use alsa_explore::testing::mocks::{
    CollectingSink, MockElement, MockEnumerator, MockMixerBackend, MockPcmBackend, MockPcmDevices,
    playback_device,
};
use nix::errno::Errno;

fn machine() -> (MockEnumerator, MockPcmDevices) {
    let enumerator = MockEnumerator::new(vec![
        playback_device(0, "Headphones", 0),
        playback_device(1, "vc4hdmi", 0),
        playback_device(2, "DAC", 0),
        playback_device(2, "DAC", 1),
    ]);
    let pcm = MockPcmDevices::new()
        .with(
            "hw:0,0",
            MockPcmBackend::new()
                .accept_formats([SampleEncoding::S16Le])
                .accept_rates([44100, 48000]),
        )
        // HDMI without a connected sink refuses every format
        .with("hw:1,0", MockPcmBackend::new().accept_rates([44100]))
        .with(
            "hw:2,0",
            MockPcmBackend::new()
                .accept_formats([SampleEncoding::S32Le, SampleEncoding::S16Le])
                .accept_rates([44100, 88200, 176400, 352800, 48000, 96000]),
        )
        .with("hw:2,1", MockPcmBackend::new().fail_open(Errno::EBUSY));
    (enumerator, pcm)
}

fn mixer() -> MockMixerBackend {
    MockMixerBackend::new(vec![
        MockElement::new("PCM", (-10239, 400)),
        MockElement::new("Digital", (-9_999_999, 0)).with_db_at(1, -9950),
    ])
}

#[test]
fn test_default_report_lists_usable_and_busy_devices() {
    let (enumerator, pcm) = machine();
    let mixer = mixer();
    let snd = tempfile::tempdir().unwrap();

    let targets = enumerate_targets(&enumerator).unwrap();
    let explorer = Explorer::new(&pcm, &mixer, ReportOptions::default());
    let mut sink = CollectingSink::default();
    let report = explorer.run(&targets, snd.path(), &mut sink);

    let verdicts: Vec<DeviceVerdict> = report.devices.iter().map(|d| d.summary.verdict).collect();
    assert_eq!(
        verdicts,
        vec![
            DeviceVerdict::Usable,
            DeviceVerdict::Unusable,
            DeviceVerdict::Usable,
            DeviceVerdict::Busy
        ]
    );

    let text = sink.text();
    assert!(text.contains("> Device:              \"hw:CARD=Headphones,DEV=0\""));
    assert!(!text.contains("vc4hdmi"));
    assert!(text.contains("  Short Name:          \"hw:2,1\""));
    assert!(text.contains("This device is in use"));
    assert!(text.contains("     44100             S32_LE"));
    // Only the best setting is shown without -e.
    assert!(!text.contains("     88200"));
    // Busy devices are given up on at the first open.
    assert_eq!(pcm.device("hw:2,1").unwrap().opens(), 1);
    assert!(text.contains("  Possible mixers:     \"PCM\""));
    assert!(text.contains("                       \"Digital\""));
    assert!(text.ends_with(&format!(
        "No sound devices were found in {}.",
        snd.path().display()
    )));
}

#[test]
fn test_extended_report_shows_everything() {
    let (enumerator, pcm) = machine();
    let mixer = mixer();
    let snd = tempfile::tempdir().unwrap();

    let options = ReportOptions {
        extended: true,
        ..ReportOptions::default()
    };
    let targets = enumerate_targets(&enumerator).unwrap();
    let explorer = Explorer::new(&pcm, &mixer, options);
    let mut sink = CollectingSink::default();
    let report = explorer.run(&targets, snd.path(), &mut sink);

    let text = sink.text();
    assert!(text.contains("hw:CARD=vc4hdmi,DEV=0"));
    assert!(text.contains("Shairport Sync can not use this device."));
    assert!(text.contains("    Card Name:         \"DAC card\""));
    assert!(text.contains("\"Digital\" (index 0, -99.50 dB to 0.00 dB)"));
    assert!(text.contains("     352800            S32_LE,S16_LE"));
    assert!(text.contains("     96000             S32_LE,S16_LE"));

    let dac = &report.devices[2];
    assert_eq!(dac.summary.rates.len(), 4);
    assert_eq!(dac.summary.alternate_rates.len(), 2);
    assert!(dac.gain_controls.iter().any(|c| c.mute_floor_resolved));
}

#[test]
fn test_named_devices_skip_enumeration() {
    let (_, pcm) = machine();
    let mixer = mixer();
    let snd = tempfile::tempdir().unwrap();

    let targets = vec![
        DeviceTarget::from_name("hw:2,0"),
        DeviceTarget::from_name("hw:9,0"),
    ];
    let explorer = Explorer::new(&pcm, &mixer, ReportOptions::default());
    let mut sink = CollectingSink::default();
    let report = explorer.run(&targets, snd.path(), &mut sink);

    assert_eq!(report.devices[0].target.mixer, "hw:2");
    assert_eq!(report.devices[0].summary.verdict, DeviceVerdict::Usable);
    assert_eq!(report.devices[1].summary.verdict, DeviceVerdict::Inaccessible);
    assert!(sink.text().contains("> Device:              \"hw:2,0\""));
}

#[test]
fn test_report_serializes_to_json() {
    let (enumerator, pcm) = machine();
    let mixer = mixer();
    let snd = tempfile::tempdir().unwrap();
    fs::write(snd.path().join("not-a-device"), b"").unwrap();

    let targets = enumerate_targets(&enumerator).unwrap();
    let explorer = Explorer::new(&pcm, &mixer, ReportOptions::default());
    let mut sink = CollectingSink::default();
    let report = explorer.run(&targets, snd.path(), &mut sink);

    match &report.accessibility {
        AccessibilityReport::Checked(finding) => assert_eq!(finding.found, 0),
        other => panic!("unexpected {:?}", other),
    }

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["devices"].as_array().unwrap().len(), 4);
    assert_eq!(json["devices"][0]["summary"]["verdict"], "usable");
    // Encodings carry the same names as the text report.
    assert_eq!(json["devices"][2]["summary"]["best"]["encoding"], "S32_LE");
    assert_eq!(
        json["devices"][2]["summary"]["rates"][0]["encodings"],
        serde_json::json!(["S32_LE", "S16_LE"])
    );
    assert_eq!(json["devices"][3]["summary"]["failure"]["outcome"], "device_busy");
    assert_eq!(json["accessibility"]["status"], "checked");
}

#[test]
fn test_missing_device_directory_is_a_warning() {
    let pcm = MockPcmBackend::new();
    let mixer = MockMixerBackend::default();
    let explorer = Explorer::new(&pcm, &mixer, ReportOptions::default());
    let mut sink = CollectingSink::default();
    let report = explorer.run(&[], "/nonexistent/snd".as_ref(), &mut sink);

    assert!(report.devices.is_empty());
    assert!(matches!(
        report.accessibility,
        AccessibilityReport::Failed { .. }
    ));
    assert_eq!(
        sink.lines,
        vec!["Warning: could not check sound device permissions: sound device directory /nonexistent/snd not found."]
    );
}

#[test]
fn test_enumeration_failure_propagates() {
    let enumerator = MockEnumerator::failing("no control interface");
    assert!(enumerator.playback_devices().is_err());
    assert!(enumerate_targets(&enumerator).is_err());
}
