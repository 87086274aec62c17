//! `version` command handler.
//!
//! Besides the crate version, lists the built-in profiles and the
//! variables each one requires, so an image's gate can be inspected
//! without reading its entrypoint.

use clap::ValueEnum;
use serde_json::{Value, json};

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::config::profiles::Profile;

fn profile_name(profile: Profile) -> String {
    profile
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

/// Version and built-in profile summary.
#[must_use]
pub fn describe() -> Value {
    let profiles: serde_json::Map<String, Value> = Profile::value_variants()
        .iter()
        .map(|p| (profile_name(*p), json!(p.requirements().names())))
        .collect();

    json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "profiles": profiles,
    })
}

/// Print version information.
pub fn run(args: &VersionArgs) {
    match args.format {
        OutputFormat::Human => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            for profile in Profile::value_variants() {
                println!(
                    "  {:<10}{}",
                    profile_name(*profile),
                    profile.requirements().names().join(", ")
                );
            }
        }
        OutputFormat::Json => println!("{}", describe()),
    }
}
