/// Example program to print the loaded configuration
///
/// Run with: cargo run -p rune-config --example print_config

fn main() {
    let config = rune_config::RuneConfig::load();

    println!("=== Rune Animation Configuration ===\n");

    println!("Animation Defaults:");
    println!("  Duration: {} ms", config.animation.duration);
    println!("  Easing: {}", config.animation.easing);
    println!("  Infinite: {}", config.animation.infinite);
    println!("  Debug: {}", config.animation.debug);
    println!();

    println!("Scheduler:");
    println!("  Mode: {:?}", config.scheduler.mode);
    println!("  Frame Interval: {} ms", config.scheduler.frame_interval_ms);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
