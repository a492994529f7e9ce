use std::fs;
use std::path::{Path, PathBuf};

use alsa_explore::audit::{AuditVerdict, DeviceNode, audit_device_nodes, collect_device_nodes, tally};
use alsa_explore::core::AuditError;

#[test]
fn test_regular_files_are_not_devices() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("controlC0"), b"").unwrap();
    fs::create_dir(dir.path().join("by-path")).unwrap();

    assert!(collect_device_nodes(dir.path()).unwrap().is_empty());

    let finding = audit_device_nodes(dir.path()).unwrap();
    assert_eq!(finding.found, 0);
    assert_eq!(finding.verdict(), AuditVerdict::NoDevices);
}

#[test]
fn test_missing_directory() {
    let err = audit_device_nodes(Path::new("/nonexistent/snd")).unwrap_err();

    assert!(matches!(err, AuditError::DirectoryMissing { .. }));
    assert_eq!(
        err.to_string(),
        "sound device directory /nonexistent/snd not found"
    );
}

#[test]
fn test_first_inaccessible_node_is_remembered() {
    let nodes: Vec<DeviceNode> = ["controlC0", "pcmC0D0p", "pcmC1D0p", "timer"]
        .iter()
        .map(|name| DeviceNode {
            path: PathBuf::from("/dev/snd").join(name),
            gid: 63,
        })
        .collect();

    let finding = tally(
        Path::new("/dev/snd"),
        &nodes,
        |p| !p.to_string_lossy().contains("pcmC1"),
        |_| Some("audio".to_string()),
    );

    assert_eq!(finding.found, 4);
    assert_eq!(finding.accessible, 3);
    let first = finding.first_inaccessible.as_ref().unwrap();
    assert_eq!(first.path, PathBuf::from("/dev/snd/pcmC1D0p"));
    assert_eq!(
        finding.remediation(),
        vec![
            "Only 3 of the 4 sound devices in /dev/snd are accessible to this user.",
            "Please check the permissions of the devices in /dev/snd.",
        ]
    );
}
