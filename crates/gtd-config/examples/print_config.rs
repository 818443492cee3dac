/// Example program to print the loaded configuration
///
/// Run with: cargo run -p gtd-config --example print_config

fn main() {
    let config = gtd_config::GtdConfig::load();

    println!("=== GNOME To Do Configuration ===\n");

    println!("Animation Settings:");
    println!("  Default Duration: {} ms", config.animation.default_duration_ms);
    println!("  Default Easing: {}", config.animation.default_easing);
    println!("  Slowdown Factor: {}", config.animation.slowdown_factor);
    println!("  Frame Rate: {} fps", config.animation.frame_rate);
    println!();

    println!("Demo Settings:");
    println!("  Property: {}", config.demo.property);
    println!("  From: {:?}", config.demo.from);
    println!("  To: {}", config.demo.to);
    println!("  Key Frames: {:?}", config.demo.key_frames);
    println!("  Key Values: {:?}", config.demo.key_values);
    println!("  Repeat Count: {}", config.demo.repeat_count);
    println!("  Auto Reverse: {}", config.demo.auto_reverse);
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
