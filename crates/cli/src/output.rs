//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use infinity_base::TagsByPlatform;
use infinity_base::udev::{NodeCheck, RELOAD_COMMANDS, UDEV_RULE_PATH};
use infinity_hid_common::HidDeviceInfo;
use infinity_hid_protocol::{Color, PlatformId};
use serde_json::{Value, json};
use std::path::Path;

use crate::commands::LedMode;

fn print_json_pretty(value: &Value, what: &str) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format {what} as JSON: {e}"),
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    print_json_pretty(&error_json, "error");
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Space separated lowercase hex, as the bytes appear on the wire.
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn tags_json(tags: &TagsByPlatform) -> Value {
    let map: serde_json::Map<String, Value> = tags
        .iter()
        .map(|(platform, entries)| {
            let entries: Vec<Value> = entries.iter().map(|t| json!(hex_bytes(t))).collect();
            (platform.to_string(), Value::Array(entries))
        })
        .collect();
    Value::Object(map)
}

pub fn print_base_list(bases: &[HidDeviceInfo], json: bool) {
    if json {
        print_json_pretty(
            &json!({
                "success": true,
                "bases": bases
            }),
            "base list",
        );
        return;
    }

    if bases.is_empty() {
        println!("{}", "No Disney Infinity base found".yellow());
        return;
    }

    println!("{}", "Disney Infinity bases:".bold());
    for base in bases {
        println!(
            "  {} {} ({})",
            "●".green(),
            base.display_name().bold(),
            base.path.dimmed()
        );
        if let Some(serial) = &base.serial_number {
            println!("    Serial: {serial}");
        }
    }
}

pub fn print_tags(tags: &TagsByPlatform, json: bool) {
    if json {
        print_json_pretty(
            &json!({
                "success": true,
                "tags": tags_json(tags)
            }),
            "tags",
        );
        return;
    }

    if tags.is_empty() {
        println!("{}", "No tags on the base".yellow());
        return;
    }

    println!("{}", "Tags on the base:".bold());
    for (platform, entries) in tags {
        println!("  Platform {}:", PlatformId(*platform).to_string().cyan());
        for tag in entries {
            println!("    {}", hex_bytes(tag));
        }
    }
}

/// One line per tag change; JSON output is one object per line.
pub fn print_tags_changed(raw: &[u8], tags: Option<&TagsByPlatform>, json: bool) {
    if json {
        let line = json!({
            "event": "tags_changed",
            "raw": hex_bytes(raw),
            "tags": tags.map(tags_json)
        });
        match serde_json::to_string(&line) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format tag event as JSON: {e}"),
        }
        return;
    }

    println!("{}", "Tags added or removed.".green());
    if let Some(tags) = tags {
        print_tags(tags, false);
    }
}

pub fn print_color_applied(platform: PlatformId, color: Color, mode: LedMode, json: bool) {
    if json {
        print_json_pretty(
            &json!({
                "success": true,
                "platform": platform,
                "mode": mode.as_str(),
                "color": [color.r, color.g, color.b]
            }),
            "LED result",
        );
    } else {
        println!(
            "{} {} platform {} to ({}, {}, {})",
            "✓".green(),
            mode.past_tense(),
            platform,
            color.r,
            color.g,
            color.b
        );
    }
}

pub fn print_udev(rule: &str, written: Option<&Path>, nodes: &[NodeCheck], json: bool) {
    if json {
        print_json_pretty(
            &json!({
                "success": true,
                "rule_path": UDEV_RULE_PATH,
                "rule": rule,
                "reload_commands": RELOAD_COMMANDS,
                "written": written.map(|p| p.display().to_string()),
                "nodes": nodes
            }),
            "udev report",
        );
        return;
    }

    print!("{rule}");
    println!();
    match written {
        Some(path) => println!("{} Wrote {}", "✓".green(), path.display()),
        None => println!("Save it as {UDEV_RULE_PATH}"),
    }
    println!("Then reload udev and re-plug the base:");
    for command in RELOAD_COMMANDS {
        println!("  {command}");
    }

    for node in nodes {
        if node.world_read_write {
            println!(
                "{} {} mode {:04o}",
                "✓".green(),
                node.path.display(),
                node.mode
            );
        } else {
            println!(
                "{} {} mode {:04o}, expected {:04o}",
                "⚠".yellow(),
                node.path.display(),
                node.mode,
                infinity_base::udev::WORLD_READ_WRITE
            );
        }
    }
}

/// Print warning message
pub fn print_warning(message: &str, json: bool) {
    if json {
        print_json_pretty(
            &json!({
                "success": true,
                "warning": message
            }),
            "warning message",
        );
    } else {
        println!("{} {}", "⚠".yellow(), message);
    }
}

/// Get error type name for JSON output
fn error_type_name(error: &Error) -> String {
    if error.downcast_ref::<infinity_base::InfinityError>().is_some() {
        return "InfinityError".to_string();
    }
    if error.downcast_ref::<infinity_base::ConfigError>().is_some() {
        return "ConfigError".to_string();
    }
    format!("{error:?}")
        .split('(')
        .next()
        .unwrap_or("Unknown")
        .trim()
        .to_string()
}
