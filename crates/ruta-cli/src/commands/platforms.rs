//! Platform table listing command.

use clap::Args;
use ruta_config::{
    PlatformConfig, builtin_platforms, list_platforms, platform_name_from_path,
    system_platforms_dir, user_platforms_dir,
};
use ruta_core::Direction;

#[derive(Args)]
pub struct PlatformsArgs {
    /// Show only bundled tables
    #[arg(long)]
    builtin: bool,

    /// Show the table search directories
    #[arg(long)]
    paths: bool,
}

pub fn run(args: PlatformsArgs) -> anyhow::Result<()> {
    if args.paths {
        println!("User tables:   {}", user_platforms_dir().display());
        println!("System tables: {}", system_platforms_dir().display());
        return Ok(());
    }

    println!("Bundled Platforms:");
    println!("==================");
    for platform in builtin_platforms() {
        print_summary(&platform.name, &platform);
    }
    println!();

    if args.builtin {
        return Ok(());
    }

    println!("Installed Platforms:");
    println!("====================");
    let tables = list_platforms();
    if tables.is_empty() {
        println!("  (none)");
        println!();
        println!("  Install a table under: {}", user_platforms_dir().display());
    }
    for path in tables {
        let name = platform_name_from_path(&path).unwrap_or_else(|| "unknown".to_string());
        match PlatformConfig::load(&path) {
            Ok(platform) => print_summary(&name, &platform),
            Err(_) => println!("  {:16} - (error loading {})", name, path.display()),
        }
    }
    println!();

    Ok(())
}

fn print_summary(name: &str, platform: &PlatformConfig) {
    let desc = platform.description.as_deref().unwrap_or("");
    println!(
        "  {:16} {:>2} out / {:>2} in  - {}",
        name,
        platform.route_count(Direction::Output),
        platform.route_count(Direction::Input),
        desc
    );
}
