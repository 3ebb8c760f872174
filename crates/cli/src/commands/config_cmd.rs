//! `recollect config` — Show configuration.

use recollect_config::RecollectConfig;

pub fn show(default: bool) -> Result<(), Box<dyn std::error::Error>> {
    if default {
        print!("{}", RecollectConfig::default_toml());
        return Ok(());
    }

    let config = RecollectConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!(
        "# {}",
        RecollectConfig::config_dir().join("config.toml").display()
    );
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
