//! Linux udev permission helpers.
//!
//! Without a rule the base's `/dev/hidraw*` node is only accessible to root.
//! The rule below grants world read/write on the node; reload udev afterwards
//! and re-plug the base (or trigger) for it to take effect.

use std::io;
use std::path::{Path, PathBuf};

/// Where the rule file is expected to live.
pub const UDEV_RULE_PATH: &str = "/etc/udev/rules.d/99-disney-infinity.rules";

/// Commands that make udev pick up a new rule.
pub const RELOAD_COMMANDS: [&str; 2] = [
    "sudo udevadm control --reload-rules",
    "sudo udevadm trigger",
];

/// Permission bits the rule assigns.
pub const WORLD_READ_WRITE: u32 = 0o666;

/// Render the rule line for a VID/PID pair, newline terminated.
pub fn udev_rule(vendor_id: u16, product_id: u16) -> String {
    format!(
        "SUBSYSTEM==\"hidraw\", ATTRS{{idVendor}}==\"{vendor_id:04x}\", \
         ATTRS{{idProduct}}==\"{product_id:04x}\", MODE=\"{WORLD_READ_WRITE:04o}\"\n"
    )
}

/// The rule for the Wii / PlayStation base.
pub fn default_rule() -> String {
    udev_rule(infinity_hid_protocol::VENDOR_ID, infinity_hid_protocol::PRODUCT_BASE)
}

/// Write the rule file, replacing any previous content.
///
/// # Errors
/// Propagates the I/O error, typically `PermissionDenied` for `/etc` without root.
pub fn write_rule(path: &Path, vendor_id: u16, product_id: u16) -> io::Result<()> {
    std::fs::write(path, udev_rule(vendor_id, product_id))?;
    tracing::info!(path = %path.display(), "wrote udev rule");
    Ok(())
}

/// Result of inspecting one device node.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NodeCheck {
    pub path: PathBuf,
    /// Permission bits, masked to `0o777`.
    pub mode: u32,
    pub world_read_write: bool,
}

/// Read the permission bits of a device node.
///
/// # Errors
/// Fails when the node does not exist or cannot be inspected, and on
/// platforms without Unix permissions.
#[cfg(unix)]
pub fn check_node_mode(path: &Path) -> io::Result<NodeCheck> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode() & 0o777;
    Ok(NodeCheck {
        path: path.to_path_buf(),
        mode,
        world_read_write: mode & WORLD_READ_WRITE == WORLD_READ_WRITE,
    })
}

#[cfg(not(unix))]
pub fn check_node_mode(_path: &Path) -> io::Result<NodeCheck> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "device node permissions are only meaningful on Unix",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_is_exact() {
        assert_eq!(
            default_rule(),
            "SUBSYSTEM==\"hidraw\", ATTRS{idVendor}==\"0e6f\", ATTRS{idProduct}==\"0129\", MODE=\"0666\"\n"
        );
    }

    #[test]
    fn rule_ids_are_lowercase_hex() {
        let rule = udev_rule(0xABCD, 0x00EF);
        assert!(rule.contains("ATTRS{idVendor}==\"abcd\""));
        assert!(rule.contains("ATTRS{idProduct}==\"00ef\""));
    }

    #[test]
    fn reload_commands() {
        assert_eq!(RELOAD_COMMANDS[0], "sudo udevadm control --reload-rules");
        assert_eq!(RELOAD_COMMANDS[1], "sudo udevadm trigger");
    }

    #[test]
    fn written_rule_matches_rendered_rule() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("99-disney-infinity.rules");
        write_rule(&path, 0x0E6F, 0x0129)?;
        assert_eq!(std::fs::read_to_string(&path)?, default_rule());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn node_mode_reports_world_read_write() -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let node = tempfile::NamedTempFile::new()?;

        std::fs::set_permissions(node.path(), std::fs::Permissions::from_mode(0o666))?;
        let check = check_node_mode(node.path())?;
        assert_eq!(check.mode, 0o666);
        assert!(check.world_read_write);
        assert_eq!(check.path, node.path());

        std::fs::set_permissions(node.path(), std::fs::Permissions::from_mode(0o600))?;
        let check = check_node_mode(node.path())?;
        assert_eq!(check.mode, 0o600);
        assert!(!check.world_read_write);

        std::fs::set_permissions(node.path(), std::fs::Permissions::from_mode(0o664))?;
        assert!(!check_node_mode(node.path())?.world_read_write);
        Ok(())
    }

    #[test]
    fn missing_node_is_an_error() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => panic!("tempdir: {e}"),
        };
        assert!(check_node_mode(&dir.path().join("hidraw99")).is_err());
    }
}
