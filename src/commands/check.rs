//! Check command implementation.
//!
//! Validates configuration and runs one pass of every enabled collector.

use crate::collector::{collect_records, MeminfoExporter};
use crate::config::{validate_effective_config, Config};
use crate::startup_checks::validate_requirements;

/// Validates configuration and memory sources.
pub fn command_check(numa: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Meminfo Exporter - System Check");
    println!("============================================");

    let mut config = config.clone();
    if numa {
        config.enable_meminfo_numa = Some(true);
    }

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(&config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📁 Checking memory sources...");
    match validate_requirements(&config) {
        Ok(_) => println!("   ✅ Sources reachable"),
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    println!("\n💾 Running collection passes...");
    let exporter = MeminfoExporter::from_config(&config);
    for (collector, result) in collect_records(&exporter) {
        match result {
            Ok(records) => println!("   ✅ {}: {} records", collector, records.len()),
            Err(e) => {
                println!("   ❌ {}: {}", collector, e);
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - exporter is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
