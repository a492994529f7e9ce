//! Checks that this process may read and write every sound device node.

use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use nix::unistd::{AccessFlags, Gid, Group, access};
use serde::Serialize;

use crate::core::error::AuditError;

pub const DEFAULT_DEVICE_DIR: &str = "/dev/snd";

/// A character or block device found in the sound device directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    pub path: PathBuf,
    pub gid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InaccessibleNode {
    pub path: PathBuf,
    pub gid: u32,
    /// Group name, when the group database knows the gid.
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessibilityFinding {
    pub directory: PathBuf,
    pub found: usize,
    pub accessible: usize,
    pub first_inaccessible: Option<InaccessibleNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditVerdict {
    NoDevices,
    AllAccessible,
    NoneAccessible,
    SomeInaccessible,
}

impl AccessibilityFinding {
    pub fn verdict(&self) -> AuditVerdict {
        if self.found == 0 {
            AuditVerdict::NoDevices
        } else if self.accessible == self.found {
            AuditVerdict::AllAccessible
        } else if self.accessible == 0 {
            AuditVerdict::NoneAccessible
        } else {
            AuditVerdict::SomeInaccessible
        }
    }

    /// Operator-facing report lines; empty when everything is accessible.
    pub fn remediation(&self) -> Vec<String> {
        let dir = self.directory.display();
        match self.verdict() {
            AuditVerdict::AllAccessible => Vec::new(),
            AuditVerdict::NoDevices => vec![format!("No sound devices were found in {}.", dir)],
            AuditVerdict::NoneAccessible => {
                let group = self
                    .first_inaccessible
                    .as_ref()
                    .map(|n| match &n.group {
                        Some(name) => format!("\"{}\"", name),
                        None => format!("with id {}", n.gid),
                    })
                    .unwrap_or_else(|| "that owns them".to_string());
                vec![
                    format!(
                        "None of the {} sound devices in {} are accessible to this user.",
                        self.found, dir
                    ),
                    format!(
                        "Add this user to the group {} or run this tool with elevated privileges.",
                        group
                    ),
                ]
            }
            AuditVerdict::SomeInaccessible => vec![
                format!(
                    "Only {} of the {} sound devices in {} are accessible to this user.",
                    self.accessible, self.found, dir
                ),
                format!("Please check the permissions of the devices in {}.", dir),
            ],
        }
    }
}

/// Character and block devices directly inside `dir`, sorted by path.
pub fn collect_device_nodes(dir: &Path) -> Result<Vec<DeviceNode>, AuditError> {
    if !dir.exists() {
        return Err(AuditError::DirectoryMissing {
            path: dir.to_path_buf(),
        });
    }
    let unreadable = |source| AuditError::Unreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut nodes = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                log::debug!("skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let file_type = metadata.file_type();
        if file_type.is_char_device() || file_type.is_block_device() {
            nodes.push(DeviceNode {
                path: entry.path(),
                gid: metadata.gid(),
            });
        }
    }
    nodes.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(nodes)
}

/// Counts the nodes `is_accessible` accepts and remembers the first one it
/// rejects.
pub fn tally<F, G>(
    dir: &Path,
    nodes: &[DeviceNode],
    is_accessible: F,
    group_name: G,
) -> AccessibilityFinding
where
    F: Fn(&Path) -> bool,
    G: Fn(u32) -> Option<String>,
{
    let mut finding = AccessibilityFinding {
        directory: dir.to_path_buf(),
        found: nodes.len(),
        accessible: 0,
        first_inaccessible: None,
    };

    for node in nodes {
        if is_accessible(&node.path) {
            finding.accessible += 1;
        } else if finding.first_inaccessible.is_none() {
            finding.first_inaccessible = Some(InaccessibleNode {
                path: node.path.clone(),
                gid: node.gid,
                group: group_name(node.gid),
            });
        }
    }
    finding
}

fn read_write_accessible(path: &Path) -> bool {
    access(path, AccessFlags::R_OK | AccessFlags::W_OK).is_ok()
}

fn lookup_group_name(gid: u32) -> Option<String> {
    Group::from_gid(Gid::from_raw(gid))
        .ok()
        .flatten()
        .map(|g| g.name)
}

/// Audits the sound device nodes in `dir` for read and write access by the
/// current user, without opening them.
pub fn audit_device_nodes(dir: &Path) -> Result<AccessibilityFinding, AuditError> {
    let nodes = collect_device_nodes(dir)?;
    let finding = tally(dir, &nodes, read_write_accessible, lookup_group_name);
    log::debug!(
        "{} of {} sound device nodes in {} are accessible",
        finding.accessible,
        finding.found,
        dir.display()
    );
    Ok(finding)
}
