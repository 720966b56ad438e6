use anyhow::Context;
use cloudlaunch_cloud::MemoryProvider;
use cloudlaunch_core::{
    AppConfig, AppKind, ChannelSink, CloudTarget, LaunchRequest, LaunchSettings, Orchestrator,
};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

pub async fn handle(
    config_path: &Path,
    image: &str,
    name: &str,
    instance_type: Option<&str>,
) -> anyhow::Result<()> {
    let app_config = AppConfig::from_path(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let settings = LaunchSettings::from_env()?;
    tracing::debug!("Dry run of {} with image {}", config_path.display(), image);

    // Instances come up on the first poll; nothing answers HTTP here
    let mut provider = MemoryProvider::new()
        .with_image(image, image)
        .with_boot_polls(Some(0));
    if let Some(custom) = app_config.config_cloudlaunch.custom_image_id()
        && custom != image
    {
        provider = provider.with_image(custom, custom);
    }

    let (sink, mut events) = ChannelSink::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{} {}", format!("[{}]", event.stage).cyan(), event.action);
        }
    });

    let mut target = CloudTarget::new(image);
    if let Some(instance_type) = instance_type {
        target = target.with_default_instance_type(instance_type);
    }
    let request = LaunchRequest::new(name, target, app_config).with_kind(AppKind::Specialized);

    let orchestrator = Orchestrator::new(Arc::new(provider), Arc::new(sink), settings)?;
    let outcome = orchestrator.launch(&request).await;
    // Closes the progress channel so the printer can finish
    drop(orchestrator);
    printer.await?;

    let result = outcome?;
    for w in &result.warnings {
        println!(
            "{}",
            format!(
                "⚠ {} rule #{} skipped: {}",
                w.security_group, w.rule_index, w.message
            )
            .yellow()
        );
    }

    println!();
    println!("{}", "✓ Dry run complete".green().bold());
    println!("{}", serde_json::to_string_pretty(&result.to_envelope()?)?);
    Ok(())
}
