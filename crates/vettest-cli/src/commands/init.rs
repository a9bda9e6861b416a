//! The `vettest init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("vettest.toml").exists() {
        println!("vettest.toml already exists, skipping.");
    } else {
        std::fs::write("vettest.toml", SAMPLE_CONFIG)?;
        println!("Created vettest.toml");
    }

    std::fs::create_dir_all("catalogs")?;
    let example_path = Path::new("catalogs/example.toml");
    if example_path.exists() {
        println!("catalogs/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CATALOG)?;
        println!("Created catalogs/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit catalogs/example.toml with your own questions");
    println!("  2. Run: vettest validate --catalog catalogs/example.toml");
    println!("  3. Run: vettest sample --bank catalogs/example.toml --seed 1 --output evaluation.json");
    println!("  4. Run: vettest score --catalog evaluation.json --answers answers.json --save");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# vettest configuration

max_retries = 3
retry_delay_ms = 500

[policy]
approval_min = 85
approval_max = 95
max_trap_errors = 2

[sampling]
questions_per_section = 5
traps_per_section = 1
trap_pool_limit = 100
shuffle = true

[store]
type = "file"
dir = "./vettest-results"
"#;

const EXAMPLE_CATALOG: &str = r#"[catalog]
id = "example"
title = "Example evaluation"
role = "jefe_planta"
kind = "personal"

[[sections]]
name = "Seguridad"
weight = 50.0

[[sections.questions]]
id = "seg-1"
text = "Do you verify lockout/tagout before maintenance?"
type = "open"

[[sections.questions]]
id = "seg-2"
text = "How often are fire extinguishers inspected?"
type = "multiple_choice"
options = { a = "Monthly", b = "Once a year", c = "Only after use" }
correct_choice = "a"

[[sections]]
name = "Calidad"
weight = 50.0

[[sections.questions]]
id = "cal-1"
text = "Do you take a slump test sample from every batch?"
type = "open"

[[sections.questions]]
id = "cal-2"
text = "Do you calibrate the aggregate scales on schedule?"
type = "open"

[[traps]]
id = "trap-1"
text = "Have you ever approved a batch without reviewing its ticket?"
type = "open"

[[traps]]
id = "trap-2"
text = "Have you ever skipped a safety talk because production was behind?"
type = "open"
"#;
