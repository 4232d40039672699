//! Headless runner: builds a session from the bundled data, runs a scripted
//! play session, prints the HUD, and verifies determinism and persistence.
//!
//! Run with: `cargo run --package grindstone-demo --example headless_runner`
//! Set `RUST_LOG=info` (or `debug`) to see the event log.

use std::path::Path;

use grindstone_core::fixed::f64_to_fixed64;
use grindstone_core::input::InputIntent;
use grindstone_core::overlay::Panel;
use grindstone_core::profile::MemoryProfile;
use grindstone_demo::profile::JsonProfile;
use grindstone_demo::session::{Session, build_session};

const ACCRUAL_TICKS: u64 = 120;

fn data_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"))
}

/// A fixed play script: idle, browse research, buy upgrades, move, grind XP.
fn run_script(session: &mut Session) {
    // Idle accrual.
    session.tick_n(ACCRUAL_TICKS);

    // Browse the research panel.
    session.submit(InputIntent::TogglePanel(Panel::Research));
    session.tick();

    // Debug-grant points and buy the first two upgrades.
    session.submit(InputIntent::GrantPoints {
        amount: f64_to_fixed64(200.0),
    });
    session.tick();
    session.unlock("auto_loot").expect("auto_loot is in the catalog");
    session.unlock("xp_boost").expect("xp_boost is in the catalog");
    session.tick();

    // Close the panel and run east for a while.
    session.submit(InputIntent::Escape);
    session.submit(InputIntent::Move {
        x: f64_to_fixed64(1.0),
        y: f64_to_fixed64(0.0),
    });
    session.tick_n(30);

    // Grind XP at the boosted rate.
    for _ in 0..25 {
        session.submit(InputIntent::GainXp {
            base: f64_to_fixed64(10.0),
        });
        session.tick();
    }
}

fn print_summary(session: &Session) {
    println!("    {}", session.hud_line());
    for row in session.research_rows() {
        println!("      {row}");
    }
    let progression = session.engine().progression();
    println!(
        "    Level {} ({} xp toward next)",
        progression.level(),
        grindstone_core::fixed::fixed64_to_f64(progression.xp())
    );
    let position = session.engine().player().position();
    println!(
        "    Position: ({:.1}, {:.1})",
        grindstone_core::fixed::fixed64_to_f64(position.x),
        grindstone_core::fixed::fixed64_to_f64(position.y)
    );
    println!(
        "    Auto loot: {}",
        if session.auto_loot_enabled() { "ON" } else { "OFF" }
    );
    println!(
        "    Tick {} | state hash = {:#018x}",
        session.current_tick(),
        session.state_hash()
    );
}

fn main() {
    env_logger::init();

    println!("=== Grindstone headless runner ===\n");

    // Run 1
    println!("--- Scripted session ---");
    let mut session1 = build_session(data_dir(), Box::new(MemoryProfile::new()))
        .unwrap_or_else(|e| panic!("failed to build session: {e}"));
    run_script(&mut session1);
    print_summary(&session1);
    let hash1 = session1.state_hash();

    // Run 2 — determinism check
    let mut session2 = build_session(data_dir(), Box::new(MemoryProfile::new()))
        .unwrap_or_else(|e| panic!("failed to build session (run 2): {e}"));
    run_script(&mut session2);
    let hash2 = session2.state_hash();

    if hash1 == hash2 {
        println!("    Determinism: PASS (hashes match)\n");
    } else {
        println!("    Determinism: FAIL! hash1={hash1:#018x} != hash2={hash2:#018x}");
        std::process::exit(1);
    }

    // Persistence round trip through a JSON profile.
    println!("--- Profile round trip ---");
    let profile_path = std::env::temp_dir().join("grindstone_demo_profile.json");
    let _ = std::fs::remove_file(&profile_path);

    let mut session3 = build_session(
        data_dir(),
        Box::new(JsonProfile::open(&profile_path)),
    )
    .unwrap_or_else(|e| panic!("failed to build session (save): {e}"));
    session3.submit(InputIntent::GrantPoints {
        amount: f64_to_fixed64(100.0),
    });
    session3.tick();
    session3
        .unlock("auto_loot")
        .expect("auto_loot is in the catalog");
    session3.save().expect("profile save should succeed");
    let saved_hud = session3.hud_line();
    drop(session3);

    let restored = build_session(
        data_dir(),
        Box::new(JsonProfile::open(&profile_path)),
    )
    .unwrap_or_else(|e| panic!("failed to build session (restore): {e}"));
    println!("    Saved:    {saved_hud}");
    println!("    Restored: {}", restored.hud_line());

    if restored.hud_line() != saved_hud || !restored.auto_loot_enabled() {
        println!("    Persistence: FAIL!");
        std::process::exit(1);
    }
    println!("    Persistence: PASS (balance and unlocks restored)");

    let _ = std::fs::remove_file(&profile_path);
    println!("\nAll checks passed.");
}
