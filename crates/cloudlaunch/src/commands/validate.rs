use anyhow::Context;
use cloudlaunch_core::{AppConfig, LaunchSettings, RootStorageType, lint_firewall};
use colored::Colorize;
use std::path::Path;

const UNSET: &str = "(not set)";

pub fn handle(config_path: &Path) -> anyhow::Result<()> {
    println!("{}", "Validating config...".blue());

    let app_config = AppConfig::from_path(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let settings = LaunchSettings::from_env()?;
    let config = &app_config.config_cloudlaunch;

    println!("{}", "✓ Config loaded".green().bold());
    println!();
    println!("Launch settings:");
    println!(
        "  image:          {}",
        config.custom_image_id().unwrap_or("(cloud default)")
    );
    println!(
        "  key pair:       {}",
        config
            .key_pair_name(&settings.default_key_pair_name)
            .cyan()
    );
    println!(
        "  instance type:  {}",
        config.instance_type().unwrap_or("(cloud default)")
    );
    println!("  zone:           {}", config.placement_zone().unwrap_or(UNSET));
    println!("  subnet:         {}", config.subnet().unwrap_or(UNSET));
    println!(
        "  network:        {}",
        config.network().unwrap_or("(default network)")
    );
    println!("  static IP:      {}", config.static_ip().unwrap_or(UNSET));

    let storage = match config.root_storage_type {
        RootStorageType::Volume => format!("volume ({} GB)", config.root_storage_size()),
        RootStorageType::Instance => "instance".to_string(),
    };
    println!("  root storage:   {}", storage);

    let public_ip = if config.skip_floating_ip {
        "skipped"
    } else {
        "reuse or allocate"
    };
    println!("  public IP:      {}", public_ip);

    if let Some(host) = config
        .hostname_config
        .as_ref()
        .and_then(|h| h.manual_host_name())
    {
        println!("  hostname:       {}", host);
    }

    println!("  firewall:       {} group(s)", config.firewall.len());
    for group in &config.firewall {
        println!(
            "    - {} ({} rule(s))",
            group.name().cyan(),
            group.rules.len()
        );
    }

    if let Some(appliance) = &app_config.config_appliance {
        let has_key = appliance
            .ssh_public_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        println!(
            "  cloud-init:     ssh key {}, {} command(s)",
            if has_key { "yes" } else { "no" },
            appliance.run_cmd.len()
        );
    }

    let warnings = lint_firewall(config);
    if !warnings.is_empty() {
        println!();
        println!(
            "{}",
            format!("⚠ {} rule(s) will be skipped:", warnings.len())
                .yellow()
                .bold()
        );
        for w in &warnings {
            println!(
                "  {} rule #{}: {}",
                w.security_group, w.rule_index, w.message
            );
        }
    }

    Ok(())
}
