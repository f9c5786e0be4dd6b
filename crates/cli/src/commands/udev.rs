//! udev rule printing, installation and hidraw permission checks

use anyhow::{Context, Result};
use infinity_base::udev::{NodeCheck, check_node_mode, udev_rule, write_rule};
use infinity_base::{BaseConfig, discover_bases};
use std::io;
use std::path::Path;

use crate::commands::{UdevArgs, open_port};
use crate::error::CliError;
use crate::output;

pub fn execute(args: &UdevArgs, config: &BaseConfig, json: bool) -> Result<()> {
    let rule = udev_rule(config.vendor_id, config.product_id);

    if let Some(path) = &args.write {
        install(path, config)?;
    }
    let nodes = if args.check {
        check_nodes(config)?
    } else {
        Vec::new()
    };

    output::print_udev(&rule, args.write.as_deref(), &nodes, json);
    Ok(())
}

fn install(path: &Path, config: &BaseConfig) -> Result<()> {
    match write_rule(path, config.vendor_id, config.product_id) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(CliError::PermissionDenied(
            format!("cannot write {}, re-run with sudo", path.display()),
        )
        .into()),
        Err(e) => Err(e).with_context(|| format!("Failed to write {}", path.display())),
    }
}

fn check_nodes(config: &BaseConfig) -> Result<Vec<NodeCheck>> {
    let port = open_port()?;
    let bases = discover_bases(port.as_ref(), config.vendor_id, config.product_id);
    if bases.is_empty() {
        return Err(CliError::DeviceNotFound(format!(
            "no base with VID={:04x} PID={:04x} to check",
            config.vendor_id, config.product_id
        ))
        .into());
    }

    bases
        .iter()
        .map(|base| {
            check_node_mode(Path::new(&base.path))
                .with_context(|| format!("Failed to inspect {}", base.path))
        })
        .collect()
}
